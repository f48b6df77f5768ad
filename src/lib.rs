//! # logsmith
//!
//! A severity based logging engine.
//!
//! - One log file per severity, a message lands in the file of its own and of every
//!   lower severity. Files roll over by size and carry a `<program>.<SEVERITY>` symlink.
//! - Messages at or above a threshold are echoed to stderr, optionally mailed.
//! - [LogSink] callbacks receive every message, with a "wait till sent" barrier.
//! - Per-module verbosity through [vlog!()] and `vmodule` glob patterns.
//! - FATAL flushes everything and then runs the failure function (abort by default).
//!
//! ``` rust
//! use logsmith::*;
//! recipe::stderr_logger().program_name("demo").test().build().expect("setup log");
//! log_info!("{} workers started", 4);
//! log_warning!("queue is {}% full", 80);
//! vlog!(1, "only shown with v >= 1");
//! ```

extern crate log;
extern crate signal_hook;

mod config;
mod destination;
mod env;
mod failure;
mod file_impl;
mod formatter;
mod log_impl;
mod mail;
mod message;
mod severity;
mod sink;
mod time;
mod utils;
mod vlog;

#[doc(hidden)]
pub mod raw;

pub mod macros;
pub mod recipe;

pub use self::{
    config::{config, set_config, update_config, Builder, Config},
    destination::{
        flush_log_files, flush_log_files_unsafe, hostname, reopen_log_files, reset_log_destinations,
        set_email_logging, set_log_destination, set_log_filename_extension, set_log_symlink,
        LogDestination,
    },
    env::{env_or, EnvVarDefault},
    failure::{
        crash_reason, fail, install_failure_function, install_product_failure_function,
        install_unit_test_failure_function, reset_crash_reason, CrashReason,
    },
    file_impl::{LogFileObject, ROLLOVER_ATTEMPT_FREQUENCY},
    log_impl::{init_logging, log_panic, setup_log},
    mail::send_email,
    message::{num_messages, reset_fatal_state, Disposition, LogMessage, MAX_LOG_MESSAGE_LEN},
    severity::{Severity, NUM_SEVERITIES},
    sink::{add_log_sink, log_sink_count, remove_log_sink, sink_to_string, LogSink},
    time::LogTime,
    utils::{is_logging_initialized, program_short_name, shutdown_logging_utilities},
    vlog::{
        reset_vmodule, safe_fnmatch, set_v, set_vlog_level, set_vmodule, v, vlog_is_on_uncached,
        vmodule_count, VLogSite,
    },
};

#[cfg(test)]
mod tests;

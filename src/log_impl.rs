use crate::{
    config::{set_config, Builder},
    destination::{flush_log_files_unsafe, reopen_log_files},
    failure::{install_product_failure_function, install_unit_test_failure_function},
    message::LogMessage,
    severity::Severity,
    utils::init_logging_utilities,
    vlog::{set_v, set_vmodule, vlog_is_on_uncached},
};
use backtrace::Backtrace;
use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use signal_hook::iterator::Signals;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Routes records of the `log` crate into the engine.
///
/// Debug and Trace become INFO messages gated by verbosity 1 and 2 of the record's file.
struct LogBridge;

static LOG_BRIDGE: LogBridge = LogBridge;

static SIGNAL_THREAD_STARTED: AtomicBool = AtomicBool::new(false);

static SETUP_LOCK: Mutex<()> = parking_lot::const_mutex(());

fn verbose_level(level: log::Level) -> Option<i32> {
    match level {
        log::Level::Debug => Some(1),
        log::Level::Trace => Some(2),
        _ => None,
    }
}

impl Log for LogBridge {
    fn enabled(&self, m: &Metadata) -> bool {
        match verbose_level(m.level()) {
            // the file is unknown here, decided per record
            Some(_) => true,
            None => Severity::from(m.level()) >= crate::config::config().min_log_level,
        }
    }

    fn log(&self, r: &Record) {
        let file = r.file().unwrap_or("<unknown>");
        if let Some(level) = verbose_level(r.level()) {
            if !vlog_is_on_uncached(file, level) {
                return;
            }
        }
        let mut msg = LogMessage::new(file, r.line().unwrap_or(0), Severity::from(r.level()));
        msg.append(*r.args());
    }

    fn flush(&self) {
        flush_log_files_unsafe(Severity::Info);
    }
}

/// log handle for panic hook
#[doc(hidden)]
pub fn log_panic(info: &std::panic::PanicHookInfo) {
    let bt = Backtrace::new();
    let (file, line) = match info.location() {
        Some(loc) => (loc.file(), loc.line()),
        None => ("<unknown>", 0),
    };
    {
        let mut msg = LogMessage::new(file, line, Severity::Error);
        msg.append(format_args!("panic occur: {}\ntrace: {:?}", info, bt));
    }
    flush_log_files_unsafe(Severity::Info);
}

fn panic_and_exit_hook(info: &std::panic::PanicHookInfo) {
    log_panic(info);
    std::process::exit(exitcode::SOFTWARE);
}

fn panic_no_exit_hook(info: &std::panic::PanicHookInfo) {
    log_panic(info);
    eprint!("continue_when_panic is set, so don't exit process");
}

/// Minimal startup: remember the program name from `argv0` and write to log files
/// from now on. FATAL dumps a stack trace and aborts.
pub fn init_logging(argv0: &str) {
    init_logging_utilities(argv0);
    install_product_failure_function();
}

/// Initialize global logger from Builder
pub fn setup_log(builder: Builder) -> Result<(), ()> {
    let _guard = SETUP_LOCK.lock();
    let program = match builder.program_name.as_ref() {
        Some(name) => name.clone(),
        None => match std::env::args().next() {
            Some(arg0) => arg0,
            None => {
                eprintln!("Initialize logger failed: no program name");
                return Err(());
            }
        },
    };
    if let Some(dir) = builder.config.log_dir.as_ref() {
        if !dir.exists() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("Initialize logger failed: create log dir {:?}: {:?}", dir, e);
                return Err(());
            }
        }
    }
    set_config(builder.config.clone());
    set_v(builder.v);
    set_vmodule(&builder.vmodule);
    init_logging_utilities(&program);
    if builder.test {
        install_unit_test_failure_function();
    } else {
        install_product_failure_function();
    }
    // files opened under the previous settings are not reused
    reopen_log_files();

    if builder.log_bridge {
        // only the first call can install it, later ones keep using it
        let _ = log::set_logger(&LOG_BRIDGE);
        log::set_max_level(LevelFilter::Trace);
    }
    if builder.panic {
        if builder.continue_when_panic {
            std::panic::set_hook(Box::new(panic_no_exit_hook));
        } else {
            std::panic::set_hook(Box::new(panic_and_exit_hook));
        }
    }

    if builder.reopen_signals.len() > 0 && !SIGNAL_THREAD_STARTED.swap(true, Ordering::SeqCst) {
        let mut signals = match Signals::new(&builder.reopen_signals) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Initialize logger failed: listen signals {:?}: {:?}", builder.reopen_signals, e);
                SIGNAL_THREAD_STARTED.store(false, Ordering::SeqCst);
                return Err(());
            }
        };
        thread::spawn(move || {
            for _sig in signals.forever() {
                reopen_log_files();
            }
        });
    }
    Ok(())
}

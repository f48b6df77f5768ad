use crate::log_impl::setup_log;
use crate::severity::Severity;
use arc_swap::ArcSwap;
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::Arc;

/// Runtime knobs of the logging engine.
///
/// A snapshot lives behind an [ArcSwap], so the hot path reads it without locking.
/// Change it with [update_config()] or through [Builder].
#[derive(Clone, Debug)]
pub struct Config {
    /// Messages below this severity are dropped before any dispatch.
    pub min_log_level: Severity,

    /// Echo to stderr when severity >= this. None never echoes.
    pub stderr_threshold: Option<Severity>,

    /// Write everything to stderr instead of log files.
    pub log_to_stderr: bool,

    /// Echo every message to stderr in addition to the log files.
    pub also_log_to_stderr: bool,

    /// Prepend the `I0102 13:14:15.000016 12345 file.rs:42] ` prefix.
    pub log_prefix: bool,

    /// Max seconds a file writer keeps data buffered.
    pub log_buf_secs: u32,

    /// Messages above this severity flush the file at once. None flushes everything.
    pub log_buf_level: Option<Severity>,

    /// Roll the log file over once it reaches this many MB. 0 is treated as 1.
    pub max_log_size: u32,

    /// Stop writing files on ENOSPC until the next flush deadline.
    pub stop_logging_if_full_disk: bool,

    /// Directory of the log files. None tries the temp dir, then the current dir.
    pub log_dir: Option<PathBuf>,

    /// Extra directory receiving an absolute symlink to each new log file.
    pub log_link: Option<PathBuf>,

    /// Comma separated mail recipients for severities >= email_level.
    pub also_log_to_email: String,

    /// Mail messages at or above this severity. None never mails.
    pub email_level: Option<Severity>,

    /// Program used to deliver mail, invoked as `<mailer> -s <subject> <dest>`.
    pub log_mailer: String,

    /// Emit a stack trace with any message logged from `<file basename>:<line>`.
    pub log_backtrace_at: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_log_level: Severity::Info,
            stderr_threshold: Some(Severity::Error),
            log_to_stderr: false,
            also_log_to_stderr: false,
            log_prefix: true,
            log_buf_secs: 30,
            log_buf_level: Some(Severity::Info),
            max_log_size: 1800,
            stop_logging_if_full_disk: false,
            log_dir: None,
            log_link: None,
            also_log_to_email: String::new(),
            email_level: None,
            log_mailer: "/bin/mail".to_string(),
            log_backtrace_at: None,
        }
    }
}

impl Config {
    #[inline]
    pub(crate) fn max_log_size_mb(&self) -> u64 {
        if self.max_log_size > 0 {
            self.max_log_size as u64
        } else {
            1
        }
    }

    #[inline]
    pub(crate) fn should_flush(&self, severity: Severity) -> bool {
        match self.log_buf_level {
            Some(level) => severity > level,
            None => true,
        }
    }
}

lazy_static! {
    static ref CONFIG: ArcSwap<Config> = ArcSwap::from_pointee(Config::default());
}

/// Current configuration snapshot.
#[inline]
pub fn config() -> Arc<Config> {
    CONFIG.load_full()
}

pub fn set_config(config: Config) {
    CONFIG.store(Arc::new(config));
}

/// Modify the configuration on the fly.
///
/// ``` rust
/// use logsmith::*;
/// update_config(|c| c.also_log_to_stderr = true);
/// ```
pub fn update_config<F: FnMut(&mut Config)>(mut f: F) {
    // rcu may run the closure more than once on contention
    CONFIG.rcu(|old| {
        let mut new = Config::clone(old);
        f(&mut new);
        new
    });
}

/// Global config to setup the logger.
/// See crate::recipe for usage
#[derive(Default)]
pub struct Builder {
    pub config: Config,

    /// Short program name used in file names, symlinks and mail subjects.
    /// Defaults to the basename of argv[0].
    pub program_name: Option<String>,

    /// Default verbosity for vlog!().
    pub v: i32,

    /// Per-module verbosity, `<glob>=<level>,...`.
    pub vmodule: String,

    /// Listen for these signals to reopen (rotate) the log files.
    /// NOTE: the listener thread is started once and not reconfigured afterwards.
    pub reopen_signals: Vec<i32>,

    /// Hookup to log error when panic
    pub panic: bool,

    /// Whether to exit program after panic
    pub continue_when_panic: bool,

    /// Route records of the `log` crate into this logger.
    pub log_bridge: bool,

    /// Failure on FATAL returns instead of aborting.
    pub(crate) test: bool,
}

impl Builder {
    pub fn new() -> Self {
        Self { log_bridge: true, ..Default::default() }
    }

    /// For test cases: FATAL does not abort, no signal listening.
    pub fn test(mut self) -> Self {
        self.test = true;
        self.reopen_signals.clear();
        self
    }

    pub fn program_name<S: Into<String>>(mut self, name: S) -> Self {
        self.program_name = Some(name.into());
        self
    }

    pub fn log_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.log_dir = Some(dir.into());
        self
    }

    pub fn log_link<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.log_link = Some(dir.into());
        self
    }

    pub fn min_log_level(mut self, severity: Severity) -> Self {
        self.config.min_log_level = severity;
        self
    }

    pub fn stderr_threshold(mut self, severity: Option<Severity>) -> Self {
        self.config.stderr_threshold = severity;
        self
    }

    pub fn log_to_stderr(mut self, on: bool) -> Self {
        self.config.log_to_stderr = on;
        self
    }

    pub fn also_log_to_stderr(mut self, on: bool) -> Self {
        self.config.also_log_to_stderr = on;
        self
    }

    pub fn log_prefix(mut self, on: bool) -> Self {
        self.config.log_prefix = on;
        self
    }

    pub fn log_buf_level(mut self, severity: Option<Severity>) -> Self {
        self.config.log_buf_level = severity;
        self
    }

    pub fn log_buf_secs(mut self, secs: u32) -> Self {
        self.config.log_buf_secs = secs;
        self
    }

    pub fn max_log_size(mut self, mb: u32) -> Self {
        self.config.max_log_size = mb;
        self
    }

    pub fn stop_logging_if_full_disk(mut self, on: bool) -> Self {
        self.config.stop_logging_if_full_disk = on;
        self
    }

    /// Mail messages at or above `severity` to the comma separated `addresses`.
    pub fn email<S: Into<String>>(mut self, severity: Severity, addresses: S) -> Self {
        self.config.email_level = Some(severity);
        self.config.also_log_to_email = addresses.into();
        self
    }

    pub fn log_mailer<S: Into<String>>(mut self, mailer: S) -> Self {
        self.config.log_mailer = mailer.into();
        self
    }

    pub fn log_backtrace_at<S: Into<String>>(mut self, location: S) -> Self {
        self.config.log_backtrace_at = Some(location.into());
        self
    }

    pub fn v(mut self, level: i32) -> Self {
        self.v = level;
        self
    }

    pub fn vmodule<S: Into<String>>(mut self, spec: S) -> Self {
        self.vmodule = spec.into();
        self
    }

    /// Add a signal which reopens the log files
    pub fn signal(mut self, signal: i32) -> Self {
        self.reopen_signals.push(signal);
        self
    }

    /// Setup global logger.
    /// Equals to setup_log(builder)
    pub fn build(self) -> Result<(), ()> {
        setup_log(self)
    }
}

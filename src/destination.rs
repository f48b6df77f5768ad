use crate::{
    config::config,
    file_impl::LogFileObject,
    mail::send_email_internal,
    message::LOG_MUTEX,
    severity::{Severity, NUM_SEVERITIES},
    time::LogTime,
    utils::{self, program_short_name, write_to_stderr},
};
use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::sync::OnceLock;

/// Where messages of one severity end up. Created on first use, never destroyed.
pub struct LogDestination {
    fileobject: LogFileObject,
}

struct EmailSettings {
    severity: Option<Severity>,
    addresses: String,
}

lazy_static! {
    static ref LOG_DESTINATIONS: [OnceLock<LogDestination>; NUM_SEVERITIES] = Default::default();
    static ref EMAIL: Mutex<EmailSettings> =
        Mutex::new(EmailSettings { severity: None, addresses: String::new() });
}

impl LogDestination {
    fn new(severity: Severity) -> Self {
        Self { fileobject: LogFileObject::new(severity, None) }
    }

    pub fn get(severity: Severity) -> &'static LogDestination {
        LOG_DESTINATIONS[severity.index()].get_or_init(|| LogDestination::new(severity))
    }

    /// Only destinations somebody already used.
    fn existing() -> impl Iterator<Item = &'static LogDestination> {
        LOG_DESTINATIONS.iter().filter_map(|d| d.get())
    }

    #[inline]
    pub(crate) fn file(&self) -> &LogFileObject {
        &self.fileobject
    }

    fn maybe_log_to_logfile(severity: Severity, time: &LogTime, message: &[u8]) {
        let should_flush = config().should_flush(severity);
        Self::get(severity).fileobject.write(should_flush, time, message);
    }

    /// Write to the file of `severity` and of every lower severity, or to stderr alone
    /// when `log_to_stderr` is set.
    pub(crate) fn log_to_all_logfiles(severity: Severity, time: &LogTime, message: &[u8]) {
        if config().log_to_stderr {
            write_to_stderr(message);
            return;
        }
        for i in (0..=severity.index()).rev() {
            if let Some(sev) = Severity::from_index(i) {
                Self::maybe_log_to_logfile(sev, time, message);
            }
        }
    }

    pub(crate) fn maybe_log_to_stderr(severity: Severity, message: &[u8]) {
        let conf = config();
        let over_threshold = matches!(conf.stderr_threshold, Some(t) if severity >= t);
        if over_threshold || conf.also_log_to_stderr {
            write_to_stderr(message);
        }
    }

    pub(crate) fn maybe_log_to_email(severity: Severity, message: &str) {
        let conf = config();
        let (api_severity, addresses) = {
            let email = EMAIL.lock();
            (email.severity, email.addresses.clone())
        };
        let by_api = matches!(api_severity, Some(s) if severity >= s);
        let by_config = matches!(conf.email_level, Some(s) if severity >= s);
        if !(by_api || by_config) {
            return;
        }
        let mut to = conf.also_log_to_email.clone();
        if !addresses.is_empty() {
            if !to.is_empty() {
                to.push(',');
            }
            to.push_str(&addresses);
        }
        let subject = format!("[LOG] {}: {}", severity, program_short_name());
        let body = format!("{}\n\n{}", hostname(), message);
        send_email_internal(&to, &subject, &body, false);
    }

    /// Flush every existing file of severity >= `min_severity`, without the ordering lock.
    pub(crate) fn flush_log_files_unsafe(min_severity: Severity) {
        let now = LogTime::now();
        for dest in Self::existing() {
            if dest.fileobject.severity() >= min_severity {
                dest.fileobject.write(true, &now, b"");
            }
        }
    }
}

pub fn hostname() -> &'static str {
    utils::hostname()
}

/// Files of severity `severity` are named `<base_filename><ext><time>.<pid>` from now on.
/// An empty `base_filename` stops logging to files of this severity.
pub fn set_log_destination(severity: Severity, base_filename: &str) {
    let _guard = LOG_MUTEX.lock();
    LogDestination::get(severity).fileobject.set_basename(base_filename);
}

/// Name the `<name>.<SEVERITY>` symlink next to the files of `severity`. Empty disables it.
pub fn set_log_symlink(severity: Severity, symlink_basename: &str) {
    let _guard = LOG_MUTEX.lock();
    LogDestination::get(severity).fileobject.set_symlink_basename(symlink_basename);
}

/// Inserted between base name and timestamp of every log file.
pub fn set_log_filename_extension(ext: &str) {
    let _guard = LOG_MUTEX.lock();
    for sev in Severity::ALL {
        LogDestination::get(sev).fileobject.set_extension(ext);
    }
}

/// Mail every message of `min_severity` or above to the comma separated `addresses`.
/// None turns it off.
pub fn set_email_logging(min_severity: Option<Severity>, addresses: &str) {
    let _guard = LOG_MUTEX.lock();
    let mut email = EMAIL.lock();
    email.severity = min_severity;
    email.addresses = addresses.to_string();
}

/// Flush the files of `min_severity` and above.
pub fn flush_log_files(min_severity: Severity) {
    let _guard = LOG_MUTEX.lock();
    LogDestination::flush_log_files_unsafe(min_severity);
}

/// Same as [flush_log_files()] but skips the ordering lock, for crash and signal paths.
pub fn flush_log_files_unsafe(min_severity: Severity) {
    LogDestination::flush_log_files_unsafe(min_severity);
}

/// Close all log files, the next message of each severity starts a fresh file.
pub fn reopen_log_files() {
    let _guard = LOG_MUTEX.lock();
    for dest in LogDestination::existing() {
        dest.fileobject.reopen();
    }
}

/// Undo every per-severity customization: derived names, no extension, symlinks named
/// after the program, no API mail recipients. Open files are closed.
#[doc(hidden)]
pub fn reset_log_destinations() {
    let _guard = LOG_MUTEX.lock();
    let name = program_short_name();
    for sev in Severity::ALL {
        let file = &LogDestination::get(sev).fileobject;
        file.reset_basename();
        file.set_extension("");
        file.set_symlink_basename(&name);
    }
    let mut email = EMAIL.lock();
    email.severity = None;
    email.addresses.clear();
}

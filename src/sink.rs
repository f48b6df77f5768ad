use crate::formatter::LinePrefix;
use crate::severity::Severity;
use crate::time::LogTime;
use crate::utils::thread_id;
use parking_lot::RwLock;
use std::sync::Arc;

/// Receiver of formatted messages besides the log files.
///
/// `send` runs while the engine holds its ordering lock, so it must be quick and must
/// not log through this crate. Slow delivery belongs in a worker, paired with
/// `wait_till_sent`, which the engine calls after releasing the lock.
pub trait LogSink: Send + Sync {
    /// `message` carries no line prefix and no trailing newline.
    fn send(
        &self, severity: Severity, full_filename: &str, base_filename: &str, line: u32,
        time: &LogTime, message: &str,
    );

    /// Block until everything handed to `send` so far is delivered.
    fn wait_till_sent(&self) {}
}

/// Render a message the way a log file line looks. Microseconds are always zero.
pub fn sink_to_string(
    severity: Severity, file: &str, line: u32, time: &LogTime, message: &str,
) -> String {
    let prefix = LinePrefix { severity, time, usecs: 0, thread_id: thread_id(), file, line };
    format!("{}{}", prefix, message)
}

static SINKS: RwLock<Vec<Arc<dyn LogSink>>> = parking_lot::const_rwlock(Vec::new());

/// Broadcast every message to `sink` until it is removed.
pub fn add_log_sink(sink: Arc<dyn LogSink>) {
    SINKS.write().push(sink);
}

/// Remove a sink added with [add_log_sink()], matched by identity.
pub fn remove_log_sink(sink: &Arc<dyn LogSink>) {
    let mut sinks = SINKS.write();
    if let Some(i) = sinks.iter().position(|s| Arc::ptr_eq(s, sink)) {
        sinks.swap_remove(i);
    }
}

pub fn log_sink_count() -> usize {
    SINKS.read().len()
}

/// Most recently added sink first.
pub(crate) fn log_to_sinks(
    severity: Severity, full_filename: &str, base_filename: &str, line: u32, time: &LogTime,
    message: &str,
) {
    let sinks = SINKS.read();
    for sink in sinks.iter().rev() {
        sink.send(severity, full_filename, base_filename, line, time, message);
    }
}

pub(crate) fn wait_for_sinks() {
    let sinks = SINKS.read();
    for sink in sinks.iter().rev() {
        sink.wait_till_sent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_sink_to_string() {
        let t = LogTime::now();
        let s = sink_to_string(Severity::Error, "sink.rs", 7, &t, "broken pipe");
        let re = Regex::new(r"^E\d{4} \d{2}:\d{2}:\d{2}\.000000 [ \d]{5,} sink\.rs:7\] broken pipe$")
            .unwrap();
        assert!(re.is_match(&s), "{}", s);
    }
}

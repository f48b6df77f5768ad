//! Assembly and dispatch of a single log message.
//!
//! A [LogMessage] collects text into a fixed size buffer and hands it to its destinations
//! when finished (explicitly or on drop). All destinations see messages in the same
//! order, the ordering lock is held for the whole dispatch.
//!
//! FATAL messages never allocate: the first one of the process takes a dedicated
//! static buffer that is kept for the crash reason, later ones share a second buffer.

use crate::{
    config::{config, Config},
    destination::LogDestination,
    failure,
    formatter::LinePrefix,
    raw::RawBuf,
    severity::{Severity, NUM_SEVERITIES},
    sink::{self, LogSink},
    time::LogTime,
    utils::{basename, is_logging_initialized, thread_id, write_to_stderr},
};
use backtrace::Backtrace;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Longer messages are silently cut.
pub const MAX_LOG_MESSAGE_LEN: usize = 30000;

type MessageText = RawBuf<MAX_LOG_MESSAGE_LEN>;

/// Held while a message is dispatched, so destinations never see interleaved output.
pub(crate) static LOG_MUTEX: Mutex<()> = parking_lot::const_mutex(());

static NUM_MESSAGES: [AtomicI64; NUM_SEVERITIES] =
    [AtomicI64::new(0), AtomicI64::new(0), AtomicI64::new(0), AtomicI64::new(0)];

static FATAL_EXCLUSIVE_AVAILABLE: Mutex<bool> = parking_lot::const_mutex(true);
static FATAL_TEXT_EXCLUSIVE: Mutex<MessageText> = parking_lot::const_mutex(RawBuf::new());
static FATAL_TEXT_SHARED: Mutex<MessageText> = parking_lot::const_mutex(RawBuf::new());

static WARNED_BEFORE_INIT: AtomicBool = AtomicBool::new(false);

/// Number of messages of `severity` dispatched so far.
pub fn num_messages(severity: Severity) -> i64 {
    NUM_MESSAGES[severity.index()].load(Ordering::Relaxed)
}

/// Make the next FATAL the first one again and forget the crash reason.
#[doc(hidden)]
pub fn reset_fatal_state() {
    *FATAL_EXCLUSIVE_AVAILABLE.lock() = true;
    failure::reset_crash_reason();
}

enum MessageBuf {
    Heap(Box<MessageText>),
    Fatal(MutexGuard<'static, MessageText>),
}

impl std::ops::Deref for MessageBuf {
    type Target = MessageText;

    fn deref(&self) -> &Self::Target {
        match self {
            MessageBuf::Heap(b) => b,
            MessageBuf::Fatal(g) => g,
        }
    }
}

impl std::ops::DerefMut for MessageBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            MessageBuf::Heap(b) => b,
            MessageBuf::Fatal(g) => g,
        }
    }
}

/// What to do with the text once the message is finished.
pub enum Disposition<'a> {
    /// Files, stderr, mail and registered sinks.
    PlainLog,
    /// Only the given sink.
    SinkOnly(Option<&'a dyn LogSink>),
    /// The given sink, then the normal destinations.
    SinkAndLog(Option<&'a dyn LogSink>),
    /// Append to the vector instead of logging. None logs normally.
    CaptureList(Option<&'a mut Vec<String>>),
    /// Store into the string and log normally.
    CaptureString(Option<&'a mut String>),
}

/// One log statement in flight.
///
/// ``` rust
/// use logsmith::*;
/// use std::fmt::Write;
/// let mut msg = LogMessage::new(file!(), line!(), Severity::Info);
/// let _ = write!(msg, "{} files copied", 3);
/// msg.finish();
/// ```
pub struct LogMessage<'a> {
    buf: MessageBuf,
    severity: Severity,
    fullname: &'a str,
    basename: &'a str,
    line: u32,
    time: LogTime,
    num_prefix_chars: usize,
    counter: u64,
    disposition: Disposition<'a>,
    first_fatal: bool,
    has_been_flushed: bool,
}

impl<'a> LogMessage<'a> {
    pub fn new(file: &'a str, line: u32, severity: Severity) -> Self {
        Self::init(file, line, severity, 0, Disposition::PlainLog)
    }

    /// `counter` is the occurrence count of an every-N or first-N statement.
    pub fn with_counter(file: &'a str, line: u32, severity: Severity, counter: u64) -> Self {
        Self::init(file, line, severity, counter, Disposition::PlainLog)
    }

    /// Deliver to `sink`, and to the normal destinations too when `also_send_to_log`.
    pub fn with_sink(
        file: &'a str, line: u32, severity: Severity, sink: Option<&'a dyn LogSink>,
        also_send_to_log: bool,
    ) -> Self {
        let disposition = if also_send_to_log {
            Disposition::SinkAndLog(sink)
        } else {
            Disposition::SinkOnly(sink)
        };
        Self::init(file, line, severity, 0, disposition)
    }

    /// Collect the text into `outvec` instead of logging it.
    pub fn with_vec(
        file: &'a str, line: u32, severity: Severity, outvec: Option<&'a mut Vec<String>>,
    ) -> Self {
        Self::init(file, line, severity, 0, Disposition::CaptureList(outvec))
    }

    /// Copy the text into `message` and log it.
    pub fn with_string(
        file: &'a str, line: u32, severity: Severity, message: Option<&'a mut String>,
    ) -> Self {
        Self::init(file, line, severity, 0, Disposition::CaptureString(message))
    }

    fn init(
        file: &'a str, line: u32, severity: Severity, counter: u64, disposition: Disposition<'a>,
    ) -> Self {
        let mut first_fatal = false;
        let mut buf = if severity == Severity::Fatal {
            let claimed = {
                let mut available = FATAL_EXCLUSIVE_AVAILABLE.lock();
                std::mem::replace(&mut *available, false)
            };
            if claimed {
                first_fatal = true;
                MessageBuf::Fatal(FATAL_TEXT_EXCLUSIVE.lock())
            } else {
                // a FATAL formatted inside another one on this thread still holds it
                match FATAL_TEXT_SHARED.try_lock() {
                    Some(guard) => MessageBuf::Fatal(guard),
                    None => MessageBuf::Heap(Box::new(RawBuf::new())),
                }
            }
        } else {
            MessageBuf::Heap(Box::new(RawBuf::new()))
        };
        buf.clear();

        let time = LogTime::now();
        let base = basename(file);
        let conf = config();
        if conf.log_prefix {
            let prefix = LinePrefix {
                severity,
                time: &time,
                usecs: time.usecs(),
                thread_id: thread_id(),
                file: base,
                line,
            };
            let _ = fmt::Write::write_fmt(&mut *buf, format_args!("{}", prefix));
        }
        let num_prefix_chars = buf.len();

        if let Some(at) = conf.log_backtrace_at.as_ref() {
            if at.strip_suffix(&format!(":{}", line)) == Some(base) {
                let bt = Backtrace::new();
                let _ = fmt::Write::write_fmt(&mut *buf, format_args!(" (stacktrace:\n{:?}) ", bt));
            }
        }

        Self {
            buf,
            severity,
            fullname: file,
            basename: base,
            line,
            time,
            num_prefix_chars,
            counter,
            disposition,
            first_fatal,
            has_been_flushed: false,
        }
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    #[inline]
    pub fn time(&self) -> &LogTime {
        &self.time
    }

    /// Append formatted text.
    #[inline]
    pub fn append(&mut self, args: fmt::Arguments) {
        let _ = fmt::Write::write_fmt(&mut *self.buf, args);
    }

    /// Target for `write!`.
    #[inline]
    pub fn stream(&mut self) -> &mut Self {
        self
    }

    /// The text collected so far, prefix included.
    pub fn text(&self) -> &str {
        self.buf.as_str()
    }

    /// Hand the message to its destinations. Later calls do nothing.
    pub fn finish(&mut self) {
        if self.has_been_flushed {
            return;
        }
        self.has_been_flushed = true;
        let conf = config();
        if self.severity < conf.min_log_level {
            return;
        }
        if !self.buf.as_str().ends_with('\n') {
            if self.buf.is_full() {
                self.buf.pop();
            }
            self.buf.push_str("\n");
        }

        let guard = LOG_MUTEX.lock();
        self.dispatch(&conf);
        NUM_MESSAGES[self.severity.index()].fetch_add(1, Ordering::Relaxed);

        if self.severity == Severity::Fatal {
            if self.first_fatal {
                let body = self.buf.as_str().get(self.num_prefix_chars..).unwrap_or("");
                failure::set_crash_reason(self.fullname, self.line, body);
            }
            if !conf.log_to_stderr {
                LogDestination::flush_log_files_unsafe(Severity::Info);
            }
            // signal handlers and sinks may log from here on
            drop(guard);
            self.wait_for_sink();
            failure::fail();
            return;
        }
        drop(guard);
        self.wait_for_sink();
    }

    fn dispatch(&mut self, conf: &Config) {
        let view = MessageView {
            severity: self.severity,
            fullname: self.fullname,
            basename: self.basename,
            line: self.line,
            time: &self.time,
            text: self.buf.as_str(),
            num_prefix_chars: self.num_prefix_chars,
        };
        match &mut self.disposition {
            Disposition::PlainLog => view.send_to_log(conf),
            Disposition::SinkOnly(sink) => view.send_to_sink(*sink),
            Disposition::SinkAndLog(sink) => {
                view.send_to_sink(*sink);
                view.send_to_log(conf);
            }
            Disposition::CaptureList(outvec) => match outvec {
                Some(v) => v.push(view.message().to_string()),
                None => view.send_to_log(conf),
            },
            Disposition::CaptureString(message) => {
                if let Some(s) = message {
                    s.clear();
                    s.push_str(view.message());
                }
                view.send_to_log(conf);
            }
        }
    }

    fn wait_for_sink(&self) {
        match &self.disposition {
            Disposition::SinkOnly(Some(s)) | Disposition::SinkAndLog(Some(s)) => s.wait_till_sent(),
            _ => {}
        }
        sink::wait_for_sinks();
    }

    /// Invoke the installed failure function.
    pub fn fail() {
        failure::fail();
    }
}

impl<'a> fmt::Write for LogMessage<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}

impl<'a> Drop for LogMessage<'a> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Borrowed fields of a finished message.
struct MessageView<'b> {
    severity: Severity,
    fullname: &'b str,
    basename: &'b str,
    line: u32,
    time: &'b LogTime,
    text: &'b str,
    num_prefix_chars: usize,
}

impl<'b> MessageView<'b> {
    /// Text without prefix and trailing newline.
    fn message(&self) -> &'b str {
        let body = self.text.get(self.num_prefix_chars..).unwrap_or("");
        body.strip_suffix('\n').unwrap_or(body)
    }

    fn send_to_sink(&self, sink: Option<&dyn LogSink>) {
        if let Some(s) = sink {
            s.send(self.severity, self.fullname, self.basename, self.line, self.time, self.message());
        }
    }

    fn send_to_log(&self, conf: &Config) {
        let initialized = is_logging_initialized();
        if !initialized && !WARNED_BEFORE_INIT.swap(true, Ordering::Relaxed) {
            write_to_stderr(b"WARNING: Logging before init_logging() is written to STDERR\n");
        }
        let bytes = self.text.as_bytes();
        if conf.log_to_stderr || !initialized {
            write_to_stderr(bytes);
        } else {
            LogDestination::log_to_all_logfiles(self.severity, self.time, bytes);
            LogDestination::maybe_log_to_stderr(self.severity, bytes);
            LogDestination::maybe_log_to_email(self.severity, self.text);
        }
        sink::log_to_sinks(
            self.severity,
            self.fullname,
            self.basename,
            self.line,
            self.time,
            self.message(),
        );
    }
}

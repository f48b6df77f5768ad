//! What happens after a FATAL message: the crash reason record and the swappable
//! failure function.

use crate::message::MAX_LOG_MESSAGE_LEN;
use crate::raw::RawBuf;
use crate::utils::write_to_stderr;
use backtrace::Backtrace;
use parking_lot::{Mutex, RwLock};

pub const MAX_STACK_DEPTH: usize = 32;

const CRASH_FILENAME_LEN: usize = 256;

/// Snapshot of the first FATAL event of the process.
#[derive(Clone)]
pub struct CrashReason {
    filename: RawBuf<CRASH_FILENAME_LEN>,
    line_number: u32,
    message: RawBuf<MAX_LOG_MESSAGE_LEN>,
    stack: [usize; MAX_STACK_DEPTH],
    depth: usize,
}

impl CrashReason {
    const fn empty() -> Self {
        Self {
            filename: RawBuf::new(),
            line_number: 0,
            message: RawBuf::new(),
            stack: [0; MAX_STACK_DEPTH],
            depth: 0,
        }
    }

    #[inline]
    pub fn filename(&self) -> &str {
        self.filename.as_str()
    }

    #[inline]
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    /// The message text without the line prefix, as long as a log record can be.
    #[inline]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Raw instruction pointers, innermost first.
    #[inline]
    pub fn stack(&self) -> &[usize] {
        &self.stack[..self.depth]
    }
}

impl std::fmt::Debug for CrashReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrashReason")
            .field("filename", &self.filename())
            .field("line_number", &self.line_number)
            .field("message", &self.message())
            .field("depth", &self.depth)
            .finish()
    }
}

static CRASH_REASON: Mutex<Option<CrashReason>> = parking_lot::const_mutex(None);

static FAILURE_FUNCTION: RwLock<fn()> = parking_lot::const_rwlock(abort_fail as fn());

fn abort_fail() {
    std::process::abort();
}

fn unit_test_fail() {}

/// Store the crash reason unless one was recorded already. Returns false if it was.
pub(crate) fn set_crash_reason(filename: &str, line: u32, message: &str) -> bool {
    let mut guard = CRASH_REASON.lock();
    if guard.is_some() {
        return false;
    }
    let mut reason = CrashReason::empty();
    reason.filename.push_str(filename);
    reason.line_number = line;
    reason.message.push_str(message);
    let mut depth = 0;
    backtrace::trace(|frame| {
        reason.stack[depth] = frame.ip() as usize;
        depth += 1;
        depth < MAX_STACK_DEPTH
    });
    reason.depth = depth;
    guard.replace(reason);
    true
}

/// Crash reason from a raw FATAL. Skipped when the lock is busy.
pub(crate) fn record_raw_crash_reason(filename: &str, line: u32, message: &str) {
    if let Some(mut guard) = CRASH_REASON.try_lock() {
        if guard.is_none() {
            let mut reason = CrashReason::empty();
            reason.filename.push_str(filename);
            reason.line_number = line;
            reason.message.push_str(message);
            guard.replace(reason);
        }
    }
}

/// The first FATAL of the process, if any happened.
///
/// Never blocks: returns None while another thread is recording.
pub fn crash_reason() -> Option<CrashReason> {
    match CRASH_REASON.try_lock() {
        Some(guard) => guard.clone(),
        None => None,
    }
}

#[doc(hidden)]
pub fn reset_crash_reason() {
    CRASH_REASON.lock().take();
}

/// Replace the function invoked after a FATAL message was flushed.
///
/// When it returns, logging goes on as if the message was an ERROR.
pub fn install_failure_function(f: fn()) {
    *FAILURE_FUNCTION.write() = f;
}

/// FATAL no longer terminates the process.
pub fn install_unit_test_failure_function() {
    install_failure_function(unit_test_fail);
}

/// FATAL prints a stack trace to stderr and aborts.
pub fn install_product_failure_function() {
    install_failure_function(dump_stack_trace_and_abort);
}

/// Invoke the installed failure function.
pub fn fail() {
    let f = *FAILURE_FUNCTION.read();
    f();
}

pub fn dump_stack_trace_and_abort() {
    write_to_stderr(b"*** Check failure stack trace: ***\n");
    let bt = Backtrace::new();
    write_to_stderr(format!("{:?}\n", bt).as_bytes());
    // skip any SIGABRT handler installed by the application
    unsafe {
        libc::signal(libc::SIGABRT, libc::SIG_DFL);
    }
    std::process::abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counting_fail() {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_crash_reason_buffer() {
        let mut reason = CrashReason::empty();
        reason.filename.push_str(&"f".repeat(1000));
        reason.message.push_str(&"x".repeat(40000));
        assert_eq!(reason.filename().len(), CRASH_FILENAME_LEN);
        assert_eq!(reason.message().len(), MAX_LOG_MESSAGE_LEN);
        assert_eq!(reason.stack().len(), 0);
    }

    #[test]
    fn test_failure_function_swap() {
        lock_file!();
        install_failure_function(counting_fail);
        fail();
        fail();
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
        install_unit_test_failure_function();
        fail();
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }
}

//! The part of the engine usable from crash and signal paths: a fixed stack buffer,
//! `libc::write` to fd 2, no heap, no blocking locks.

use crate::failure;
use crate::severity::Severity;
use crate::utils::{basename, thread_id, write_to_stderr};
use chrono::{Datelike, Local, Timelike};
use std::fmt;

const RAW_BUF_SIZE: usize = 3000;

/// Formats into a fixed array, silently dropping what does not fit.
#[derive(Clone, Copy)]
pub struct RawBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> RawBuf<N> {
    pub const fn new() -> Self {
        Self { buf: [0u8; N], len: 0 }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Drop the last char.
    pub fn pop(&mut self) {
        if let Some(c) = self.as_str().chars().last() {
            self.len -= c.len_utf8();
        }
    }

    /// Append as much of `s` as fits, cutting on a char boundary.
    pub fn push_str(&mut self, s: &str) -> usize {
        let room = N - self.len;
        let mut n = s.len().min(room);
        while n > 0 && !s.is_char_boundary(n) {
            n -= 1;
        }
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        n
    }

    pub fn as_str(&self) -> &str {
        // only whole chars are ever pushed
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

impl<const N: usize> fmt::Write for RawBuf<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

/// Backend of [raw_log!](crate::raw_log!).
#[doc(hidden)]
pub fn raw_log(severity: Severity, file: &str, line: u32, args: fmt::Arguments) {
    use std::fmt::Write;
    let mut buf = RawBuf::<RAW_BUF_SIZE>::new();
    let now = Local::now();
    let _ = write!(
        buf,
        "{}{:02}{:02} {:02}:{:02}:{:02}.{:06} {:>5} {}:{}] RAW: ",
        severity.letter(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.timestamp_subsec_micros() % 1_000_000,
        thread_id(),
        basename(file),
        line
    );
    let _ = buf.write_fmt(args);
    if buf.is_full() {
        buf.pop();
    }
    let _ = buf.write_str("\n");
    write_to_stderr(buf.as_bytes());
    if severity == Severity::Fatal {
        failure::record_raw_crash_reason(file, line, buf.as_str());
        failure::fail();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_raw_buf_truncate() {
        let mut buf = RawBuf::<8>::new();
        let _ = write!(buf, "{}", "0123456789");
        assert_eq!(buf.as_str(), "01234567");
        assert!(buf.is_full());
        buf.clear();
        // 'é' takes two bytes and must not be split
        assert_eq!(buf.push_str("abcdefgé"), 7);
        assert_eq!(buf.as_str(), "abcdefg");
        assert_eq!(buf.len(), 7);
    }
}

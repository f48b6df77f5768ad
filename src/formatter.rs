use crate::severity::Severity;
use crate::time::LogTime;
use chrono::{Datelike, Timelike};
use std::fmt;

/// Fields of the line prefix `Lmmdd hh:mm:ss.uuuuuu threadid file:line] `.
pub struct LinePrefix<'a> {
    pub severity: Severity,
    pub time: &'a LogTime,
    pub usecs: u32,
    pub thread_id: u32,
    pub file: &'a str,
    pub line: u32,
}

impl<'a> fmt::Display for LinePrefix<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:02}{:02} {:02}:{:02}:{:02}.{:06} {:>5} {}:{}] ",
            self.severity.letter(),
            self.time.month(),
            self.time.day(),
            self.time.hour(),
            self.time.minute(),
            self.time.second(),
            self.usecs,
            self.thread_id,
            self.file,
            self.line
        )
    }
}

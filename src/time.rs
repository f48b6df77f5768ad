use chrono::{DateTime, Local, TimeZone};

/// Wall-clock timestamp of a log message, in local time.
#[derive(Clone, Copy, Debug)]
pub struct LogTime(DateTime<Local>);

impl std::ops::Deref for LogTime {
    type Target = DateTime<Local>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl LogTime {
    pub fn now() -> Self {
        return Self(Local::now());
    }

    /// Whole seconds since the epoch, falls back to the epoch for invalid input.
    pub fn from_secs(secs: i64) -> Self {
        match Local.timestamp_opt(secs, 0) {
            chrono::LocalResult::Single(t) => Self(t),
            chrono::LocalResult::Ambiguous(t, _) => Self(t),
            chrono::LocalResult::None => {
                Self(DateTime::<chrono::Utc>::UNIX_EPOCH.with_timezone(&Local))
            }
        }
    }

    #[inline]
    pub fn secs(&self) -> i64 {
        self.0.timestamp()
    }

    #[inline]
    pub fn usecs(&self) -> u32 {
        // leap seconds report >= 1_000_000
        self.0.timestamp_subsec_micros() % 1_000_000
    }
}

impl From<DateTime<Local>> for LogTime {
    fn from(t: DateTime<Local>) -> Self {
        Self(t)
    }
}

use std::fmt;
use std::str::FromStr;

pub const NUM_SEVERITIES: usize = 4;

/// Severity of a log message, ordered from least to most severe.
///
/// A message of severity `s` lands in the log file of `s` and of every lower severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Info = 0,
    Warning = 1,
    Error = 2,
    Fatal = 3,
}

impl Severity {
    pub const ALL: [Severity; NUM_SEVERITIES] =
        [Severity::Info, Severity::Warning, Severity::Error, Severity::Fatal];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// First character of the name, used as the line prefix.
    #[inline]
    pub fn letter(&self) -> char {
        match self {
            Severity::Info => 'I',
            Severity::Warning => 'W',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    /// Accepts the names (any case) or the ranks "0" to "3".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(i) = s.parse::<usize>() {
            return Self::from_index(i).ok_or(());
        }
        for sev in Self::ALL {
            if sev.as_str().eq_ignore_ascii_case(s) {
                return Ok(sev);
            }
        }
        if s.eq_ignore_ascii_case("warn") {
            return Ok(Severity::Warning);
        }
        Err(())
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Severity::Error,
            log::Level::Warn => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
        for (i, sev) in Severity::ALL.iter().enumerate() {
            assert_eq!(sev.index(), i);
            assert_eq!(Severity::from_index(i), Some(*sev));
        }
        assert_eq!(Severity::from_index(NUM_SEVERITIES), None);
    }

    #[test]
    fn test_severity_names() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
        assert_eq!(Severity::Fatal.letter(), 'F');
        assert_eq!(Severity::from_str("error"), Ok(Severity::Error));
        assert_eq!(Severity::from_str("Warn"), Ok(Severity::Warning));
        assert_eq!(Severity::from_str("3"), Ok(Severity::Fatal));
        assert_eq!(Severity::from_str("4"), Err(()));
        assert_eq!(Severity::from_str("debug"), Err(()));
    }

    #[test]
    fn test_from_log_level() {
        assert_eq!(Severity::from(log::Level::Error), Severity::Error);
        assert_eq!(Severity::from(log::Level::Warn), Severity::Warning);
        assert_eq!(Severity::from(log::Level::Trace), Severity::Info);
    }
}

//! The recipe module contains some prelude functions that construct a [Builder] for
//! convenience use. Please click to the description and source for reference.

use crate::*;
use std::path::PathBuf;

fn with_panic_default(mut config: Builder) -> Builder {
    config.panic = true;
    // panic on debugging
    #[cfg(debug_assertions)]
    {
        config.continue_when_panic = false;
    }
    // do not panic on release
    #[cfg(not(debug_assertions))]
    {
        config.continue_when_panic = true;
    }
    config
}

/// Everything to stderr, no log files.
///
/// You don't care the speed when output to console.
pub fn stderr_logger() -> Builder {
    with_panic_default(Builder::new().log_to_stderr(true))
}

/// One file per severity in `dir`, ERROR and above echoed to stderr.
///
/// SIGUSR1 closes the files, so an external rotate job can move them away.
///
/// The type of `dir` can be &str / String / &OsStr / OsString / Path / PathBuf.
pub fn file_logger<P: Into<PathBuf>>(dir: P) -> Builder {
    with_panic_default(Builder::new().log_dir(dir).signal(signal_hook::consts::SIGUSR1))
}

/// Configure the logger from environment.
///
/// - `LOG_DIR`: directory of the log files. Empty means the temp dir.
/// - `LOG_TO_STDERR`: write to stderr instead of files.
/// - `ALSO_LOG_TO_STDERR`: echo everything to stderr.
/// - `LOG_STDERR_THRESHOLD`: echo this severity and above to stderr, default ERROR.
/// - `LOG_MIN_LEVEL`: drop messages below this severity, default INFO.
/// - `LOG_MAX_SIZE`: roll files over at this many MB, default 1800.
/// - `LOG_V`, `LOG_VMODULE`: verbosity.
///
/// # Example:
///
/// ``` rust
/// use logsmith::recipe;
/// let _ = recipe::env_logger().test().build();
/// ```
pub fn env_logger() -> Builder {
    let dir: String = env_or("LOG_DIR", "").into();
    let mut builder = with_panic_default(Builder::new().signal(signal_hook::consts::SIGUSR1));
    if !dir.is_empty() {
        builder = builder.log_dir(dir);
    }
    let threshold: Severity = env_or("LOG_STDERR_THRESHOLD", Severity::Error).into();
    let min_level: Severity = env_or("LOG_MIN_LEVEL", Severity::Info).into();
    let max_size: u32 = env_or("LOG_MAX_SIZE", 1800u32).into();
    let v: i32 = env_or("LOG_V", 0i32).into();
    let vmodule: String = env_or("LOG_VMODULE", "").into();
    builder
        .log_to_stderr(env_or("LOG_TO_STDERR", false).into())
        .also_log_to_stderr(env_or("ALSO_LOG_TO_STDERR", false).into())
        .stderr_threshold(Some(threshold))
        .min_log_level(min_level)
        .max_log_size(max_size)
        .v(v)
        .vmodule(vmodule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_abort_on_fatal() {
        for builder in [stderr_logger(), file_logger("/tmp/logsmith_recipe"), env_logger()] {
            assert!(!builder.test);
            assert!(builder.panic);
        }
        assert!(stderr_logger().test().test);
        assert!(stderr_logger().config.log_to_stderr);
    }
}

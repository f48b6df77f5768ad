use crate::severity::Severity;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A named environment variable with its fallback, see [env_or()].
pub struct EnvVarDefault<'a, T> {
    pub(crate) name: &'a str,
    pub(crate) default: T,
}

/// Read a logger setting from the environment, falling back to `default` when unset or invalid.
///
/// Convert with `.into()` to Severity, i32, u32, bool, String or PathBuf.
///
/// ```rust
/// use logsmith::*;
/// let _threshold: Severity = env_or("LOG_STDERR_THRESHOLD", Severity::Error).into();
/// let _dir: std::path::PathBuf = env_or("LOG_DIR", "/tmp").into();
/// let _v: i32 = env_or("LOG_V", 0i32).into();
/// ```
pub fn env_or<'a, T>(name: &'a str, default: T) -> EnvVarDefault<'a, T> {
    EnvVarDefault { name, default }
}

fn parse_or_default<T: Debug, F: FnOnce(&str) -> Option<T>>(
    var: EnvVarDefault<'_, T>, parse: F,
) -> T {
    let Ok(raw) = std::env::var(var.name) else {
        return var.default;
    };
    match parse(raw.trim()) {
        Some(v) => v,
        None => {
            eprintln!("env {}={} is not valid, set to {:?}", var.name, raw, var.default);
            var.default
        }
    }
}

macro_rules! from_env_parse {
    ($($type: ty),+) => {
        $(
            impl<'a> From<EnvVarDefault<'a, $type>> for $type {
                fn from(var: EnvVarDefault<'a, $type>) -> Self {
                    parse_or_default(var, |s| <$type>::from_str(s).ok())
                }
            }
        )+
    };
}

from_env_parse!(Severity, i32, u32);

/// Accepts 1/0, true/false, yes/no, on/off.
impl<'a> From<EnvVarDefault<'a, bool>> for bool {
    fn from(var: EnvVarDefault<'a, bool>) -> Self {
        parse_or_default(var, |s| match s.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
    }
}

/// Taken verbatim, an empty value included.
impl<'a> From<EnvVarDefault<'a, &'a str>> for String {
    fn from(var: EnvVarDefault<'a, &'a str>) -> Self {
        std::env::var(var.name).unwrap_or_else(|_| var.default.to_string())
    }
}

/// An empty value counts as unset.
impl<'a, P: AsRef<Path>> From<EnvVarDefault<'a, P>> for PathBuf {
    fn from(var: EnvVarDefault<'a, P>) -> Self {
        match std::env::var_os(var.name) {
            Some(v) if !v.is_empty() => PathBuf::from(v),
            _ => var.default.as_ref().to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("LOGSMITH_ENV_SEV_NAME", Some("warning"), Severity::Warning)]
    #[case("LOGSMITH_ENV_SEV_INDEX", Some("2"), Severity::Error)]
    #[case("LOGSMITH_ENV_SEV_BAD", Some("loud"), Severity::Info)]
    #[case("LOGSMITH_ENV_SEV_UNSET", None, Severity::Info)]
    fn test_env_severity(#[case] name: &str, #[case] value: Option<&str>, #[case] expect: Severity) {
        if let Some(v) = value {
            unsafe { std::env::set_var(name, v) };
        }
        let sev: Severity = env_or(name, Severity::Info).into();
        assert_eq!(sev, expect);
    }

    #[rstest]
    #[case("LOGSMITH_ENV_FLAG_YES", "yes", true)]
    #[case("LOGSMITH_ENV_FLAG_OFF", " OFF ", false)]
    #[case("LOGSMITH_ENV_FLAG_BAD", "maybe", true)]
    fn test_env_flag(#[case] name: &str, #[case] value: &str, #[case] expect: bool) {
        unsafe { std::env::set_var(name, value) };
        let on: bool = env_or(name, true).into();
        assert_eq!(on, expect);
    }

    #[test]
    fn test_env_number_and_path() {
        unsafe { std::env::set_var("LOGSMITH_ENV_MAX_SIZE", " 64 ") };
        let size: u32 = env_or("LOGSMITH_ENV_MAX_SIZE", 1800u32).into();
        assert_eq!(size, 64);

        unsafe { std::env::set_var("LOGSMITH_ENV_LOG_DIR", "") };
        let dir: PathBuf = env_or("LOGSMITH_ENV_LOG_DIR", "/var/log/app").into();
        assert_eq!(dir, PathBuf::from("/var/log/app"));
        let raw: String = env_or("LOGSMITH_ENV_LOG_DIR", "/var/log/app").into();
        assert_eq!(raw, "");
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! do_log {
    ($sev:expr, $ctr:expr, $($arg:tt)+) => ({
        let mut __msg = $crate::LogMessage::with_counter(std::file!(), std::line!(), $sev, $ctr);
        __msg.append(std::format_args!($($arg)+));
    });
}
#[allow(unused_imports)]
pub(super) use do_log;

/// Log at the given [Severity](crate::Severity).
///
/// ``` rust
/// use logsmith::*;
/// log_at!(Severity::Warning, "disk usage at {}%", 91);
/// ```
#[macro_export]
macro_rules! log_at {
    ($sev:expr, $($arg:tt)+) => (
        $crate::do_log!($sev, 0, $($arg)+)
    )
}
#[allow(unused_imports)]
pub(super) use log_at;

/// Log at INFO, arguments like [std::format!()].
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => (
        $crate::do_log!($crate::Severity::Info, 0, $($arg)+)
    )
}
#[allow(unused_imports)]
pub(super) use log_info;

/// Log at WARNING.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => (
        $crate::do_log!($crate::Severity::Warning, 0, $($arg)+)
    )
}
#[allow(unused_imports)]
pub(super) use log_warning;

/// Log at ERROR.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => (
        $crate::do_log!($crate::Severity::Error, 0, $($arg)+)
    )
}
#[allow(unused_imports)]
pub(super) use log_error;

/// Log at FATAL: flush every log file, then run the failure function (abort by default).
#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)+) => (
        $crate::do_log!($crate::Severity::Fatal, 0, $($arg)+)
    )
}
#[allow(unused_imports)]
pub(super) use log_fatal;

/// Log only when the condition holds.
///
/// ``` rust
/// use logsmith::*;
/// let retries = 4;
/// log_if!(Severity::Info, retries > 3, "still retrying after {} attempts", retries);
/// ```
#[macro_export]
macro_rules! log_if {
    ($sev:expr, $cond:expr, $($arg:tt)+) => (
        if $cond {
            $crate::do_log!($sev, 0, $($arg)+);
        }
    )
}
#[allow(unused_imports)]
pub(super) use log_if;

/// Log on the 1st, (n+1)th, (2n+1)th ... time this statement runs.
///
/// Bind the occurrence count with `|name|` before the format string.
///
/// ``` rust
/// use logsmith::*;
/// for _ in 0..10 {
///     log_every_n!(Severity::Info, 3, |n| "polled {} times", n);
/// }
/// ```
#[macro_export]
macro_rules! log_every_n {
    ($sev:expr, $n:expr, |$ctr:ident| $($arg:tt)+) => ({
        static __OCCURRENCES: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let __n = ($n) as u64;
        let __count = __OCCURRENCES.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
        if __n > 0 && (__count - 1) % __n == 0 {
            #[allow(unused_variables)]
            let $ctr = __count;
            $crate::do_log!($sev, __count, $($arg)+);
        }
    });
    ($sev:expr, $n:expr, $($arg:tt)+) => (
        $crate::log_every_n!($sev, $n, |__ctr| $($arg)+)
    );
}
#[allow(unused_imports)]
pub(super) use log_every_n;

/// Like [log_every_n!()], counting only the runs where the condition holds.
#[macro_export]
macro_rules! log_if_every_n {
    ($sev:expr, $cond:expr, $n:expr, |$ctr:ident| $($arg:tt)+) => ({
        static __OCCURRENCES: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        static __OCCURRENCES_MOD_N: std::sync::atomic::AtomicU64 =
            std::sync::atomic::AtomicU64::new(0);
        let __n = ($n) as u64;
        let __count = __OCCURRENCES.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
        if $cond {
            let __hit = __OCCURRENCES_MOD_N.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            if __n > 0 && __hit % __n == 0 {
                #[allow(unused_variables)]
                let $ctr = __count;
                $crate::do_log!($sev, __count, $($arg)+);
            }
        }
    });
    ($sev:expr, $cond:expr, $n:expr, $($arg:tt)+) => (
        $crate::log_if_every_n!($sev, $cond, $n, |__ctr| $($arg)+)
    );
}
#[allow(unused_imports)]
pub(super) use log_if_every_n;

/// Log only the first n times this statement runs.
#[macro_export]
macro_rules! log_first_n {
    ($sev:expr, $n:expr, |$ctr:ident| $($arg:tt)+) => ({
        static __OCCURRENCES: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let __n = ($n) as u64;
        let __prev = __OCCURRENCES.fetch_update(
            std::sync::atomic::Ordering::Relaxed,
            std::sync::atomic::Ordering::Relaxed,
            |c| if c < __n { Some(c + 1) } else { None },
        );
        if let Ok(__prev) = __prev {
            #[allow(unused_variables)]
            let $ctr = __prev + 1;
            $crate::do_log!($sev, __prev + 1, $($arg)+);
        }
    });
    ($sev:expr, $n:expr, $($arg:tt)+) => (
        $crate::log_first_n!($sev, $n, |__ctr| $($arg)+)
    );
}
#[allow(unused_imports)]
pub(super) use log_first_n;

/// True when verbosity `level` is enabled for the calling file.
///
/// The matching level cell is cached per call site after the first evaluation.
#[macro_export]
macro_rules! vlog_is_on {
    ($level:expr) => ({
        static __SITE: $crate::VLogSite = $crate::VLogSite::new();
        __SITE.is_on(std::file!(), $level)
    });
}
#[allow(unused_imports)]
pub(super) use vlog_is_on;

/// Log at INFO when verbosity `level` is enabled for this file.
///
/// ``` rust
/// use logsmith::*;
/// vlog!(2, "cache miss for key {}", "user:42");
/// ```
#[macro_export]
macro_rules! vlog {
    ($level:expr, $($arg:tt)+) => (
        if $crate::vlog_is_on!($level) {
            $crate::do_log!($crate::Severity::Info, 0, $($arg)+);
        }
    )
}
#[allow(unused_imports)]
pub(super) use vlog;

#[macro_export]
macro_rules! vlog_if {
    ($level:expr, $cond:expr, $($arg:tt)+) => (
        if $crate::vlog_is_on!($level) && $cond {
            $crate::do_log!($crate::Severity::Info, 0, $($arg)+);
        }
    )
}
#[allow(unused_imports)]
pub(super) use vlog_if;

#[macro_export]
macro_rules! vlog_every_n {
    ($level:expr, $n:expr, $($arg:tt)+) => (
        $crate::log_if_every_n!($crate::Severity::Info, $crate::vlog_is_on!($level), $n, $($arg)+)
    )
}
#[allow(unused_imports)]
pub(super) use vlog_every_n;

/// Log "Assert failed: <cond>" at FATAL when the condition does not hold.
#[macro_export]
macro_rules! log_assert {
    ($cond:expr $(,)?) => (
        if !($cond) {
            $crate::do_log!($crate::Severity::Fatal, 0, "Assert failed: {}", std::stringify!($cond));
        }
    )
}
#[allow(unused_imports)]
pub(super) use log_assert;

/// Log "Check failed: <cond> " plus the optional message at FATAL when the condition
/// does not hold. Unlike [std::assert!()] this always runs, also in release builds.
///
/// ``` rust
/// use logsmith::*;
/// let queue_len = 3;
/// check!(queue_len < 10, "queue overflow: {}", queue_len);
/// ```
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => (
        if !($cond) {
            $crate::do_log!($crate::Severity::Fatal, 0, "Check failed: {} ", std::stringify!($cond));
        }
    );
    ($cond:expr, $($arg:tt)+) => (
        if !($cond) {
            $crate::do_log!(
                $crate::Severity::Fatal, 0,
                "Check failed: {} {}", std::stringify!($cond), std::format_args!($($arg)+)
            );
        }
    );
}
#[allow(unused_imports)]
pub(super) use check;

#[doc(hidden)]
#[macro_export]
macro_rules! check_op {
    ($op:tt, $left:expr, $right:expr $(,)?) => (
        match (&($left), &($right)) {
            (__left, __right) => {
                if !(*__left $op *__right) {
                    $crate::do_log!(
                        $crate::Severity::Fatal, 0,
                        "Check failed: {} {} {} ({:?} vs. {:?}) ",
                        std::stringify!($left), std::stringify!($op), std::stringify!($right),
                        __left, __right
                    );
                }
            }
        }
    );
    ($op:tt, $left:expr, $right:expr, $($arg:tt)+) => (
        match (&($left), &($right)) {
            (__left, __right) => {
                if !(*__left $op *__right) {
                    $crate::do_log!(
                        $crate::Severity::Fatal, 0,
                        "Check failed: {} {} {} ({:?} vs. {:?}) {}",
                        std::stringify!($left), std::stringify!($op), std::stringify!($right),
                        __left, __right, std::format_args!($($arg)+)
                    );
                }
            }
        }
    );
}
#[allow(unused_imports)]
pub(super) use check_op;

/// ``` rust
/// use logsmith::*;
/// check_eq!(2 + 2, 4);
/// check_eq!("a", "a", "names must agree");
/// ```
#[macro_export]
macro_rules! check_eq {
    ($($arg:tt)+) => ($crate::check_op!(==, $($arg)+));
}
#[allow(unused_imports)]
pub(super) use check_eq;

#[macro_export]
macro_rules! check_ne {
    ($($arg:tt)+) => ($crate::check_op!(!=, $($arg)+));
}
#[allow(unused_imports)]
pub(super) use check_ne;

#[macro_export]
macro_rules! check_le {
    ($($arg:tt)+) => ($crate::check_op!(<=, $($arg)+));
}
#[allow(unused_imports)]
pub(super) use check_le;

#[macro_export]
macro_rules! check_lt {
    ($($arg:tt)+) => ($crate::check_op!(<, $($arg)+));
}
#[allow(unused_imports)]
pub(super) use check_lt;

#[macro_export]
macro_rules! check_ge {
    ($($arg:tt)+) => ($crate::check_op!(>=, $($arg)+));
}
#[allow(unused_imports)]
pub(super) use check_ge;

#[macro_export]
macro_rules! check_gt {
    ($($arg:tt)+) => ($crate::check_op!(>, $($arg)+));
}
#[allow(unused_imports)]
pub(super) use check_gt;

#[doc(hidden)]
pub fn str_repr(s: Option<&str>) -> String {
    match s {
        Some(s) => format!("\"{}\"", s),
        None => "NULL".to_string(),
    }
}

/// Compare two `Option<&str>`, where None stands for a missing string.
#[macro_export]
macro_rules! check_streq {
    ($left:expr, $right:expr $(,)?) => ({
        let (__left, __right): (Option<&str>, Option<&str>) = ($left, $right);
        if __left != __right {
            $crate::do_log!(
                $crate::Severity::Fatal, 0,
                "Check failed: {} == {} ({} vs. {}) ",
                std::stringify!($left), std::stringify!($right),
                $crate::macros::str_repr(__left), $crate::macros::str_repr(__right)
            );
        }
    });
}
#[allow(unused_imports)]
pub(super) use check_streq;

#[macro_export]
macro_rules! check_strne {
    ($left:expr, $right:expr $(,)?) => ({
        let (__left, __right): (Option<&str>, Option<&str>) = ($left, $right);
        if __left == __right {
            $crate::do_log!(
                $crate::Severity::Fatal, 0,
                "Check failed: {} != {} ({} vs. {}) ",
                std::stringify!($left), std::stringify!($right),
                $crate::macros::str_repr(__left), $crate::macros::str_repr(__right)
            );
        }
    });
}
#[allow(unused_imports)]
pub(super) use check_strne;

/// Check `left` lies within `margin` of `right`.
#[macro_export]
macro_rules! check_near {
    ($left:expr, $right:expr, $margin:expr $(,)?) => ({
        $crate::check_le!($left, ($right) + ($margin));
        $crate::check_ge!($left, ($right) - ($margin));
    });
}
#[allow(unused_imports)]
pub(super) use check_near;

/// Log normally, and copy the text (without prefix and newline) into an `Option<&mut String>`.
///
/// ``` rust
/// use logsmith::*;
/// let mut last = String::new();
/// log_to_string!(Severity::Info, Some(&mut last), "connected to {}", "db1");
/// assert_eq!(last, "connected to db1");
/// ```
#[macro_export]
macro_rules! log_to_string {
    ($sev:expr, $message:expr, $($arg:tt)+) => ({
        let mut __msg = $crate::LogMessage::with_string(std::file!(), std::line!(), $sev, $message);
        __msg.append(std::format_args!($($arg)+));
    });
}
#[allow(unused_imports)]
pub(super) use log_to_string;

/// Push the text into an `Option<&mut Vec<String>>` instead of logging. None logs normally.
#[macro_export]
macro_rules! log_string {
    ($sev:expr, $outvec:expr, $($arg:tt)+) => ({
        let mut __msg = $crate::LogMessage::with_vec(std::file!(), std::line!(), $sev, $outvec);
        __msg.append(std::format_args!($($arg)+));
    });
}
#[allow(unused_imports)]
pub(super) use log_string;

/// Send to an `Option<&dyn LogSink>` and log normally.
#[macro_export]
macro_rules! log_to_sink {
    ($sink:expr, $sev:expr, $($arg:tt)+) => ({
        let mut __msg =
            $crate::LogMessage::with_sink(std::file!(), std::line!(), $sev, $sink, true);
        __msg.append(std::format_args!($($arg)+));
    });
}
#[allow(unused_imports)]
pub(super) use log_to_sink;

/// Send to an `Option<&dyn LogSink>` only.
#[macro_export]
macro_rules! log_to_sink_but_not_to_logfile {
    ($sink:expr, $sev:expr, $($arg:tt)+) => ({
        let mut __msg =
            $crate::LogMessage::with_sink(std::file!(), std::line!(), $sev, $sink, false);
        __msg.append(std::format_args!($($arg)+));
    });
}
#[allow(unused_imports)]
pub(super) use log_to_sink_but_not_to_logfile;

/// Write a line straight to stderr without locks or allocation, usable in signal handlers.
/// Output is cut at 3000 bytes. FATAL runs the failure function afterwards.
#[macro_export]
macro_rules! raw_log {
    ($sev:expr, $($arg:tt)+) => (
        $crate::raw::raw_log($sev, std::file!(), std::line!(), std::format_args!($($arg)+))
    )
}
#[allow(unused_imports)]
pub(super) use raw_log;

//! Hand-off of alert mails to an external mailer program.

use crate::config::config;
use std::io::Write;
use std::process::{Command, Stdio};

/// Pipe `body` into `<log_mailer> -s <subject> <dest>`. Returns true when the mailer ran.
///
/// Problems are reported through the logging pipeline, so do not call this while
/// the engine holds its ordering lock.
pub fn send_email(dest: &str, subject: &str, body: &str) -> bool {
    send_email_internal(dest, subject, body, true)
}

/// With `use_logging` false every diagnostic goes straight to stderr.
pub(crate) fn send_email_internal(dest: &str, subject: &str, body: &str, use_logging: bool) -> bool {
    if dest.is_empty() {
        return false;
    }
    if use_logging {
        crate::vlog!(1, "Trying to send TITLE:{} BODY:{} to {}", subject, body, dest);
    } else {
        eprintln!("Trying to send TITLE: {} BODY: {} to {}", subject, body, dest);
    }

    let mailer = config().log_mailer.clone();
    let child = Command::new(&mailer)
        .arg("-s")
        .arg(subject)
        .arg(dest)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn();
    let mut child = match child {
        Ok(c) => c,
        Err(e) => {
            if use_logging {
                crate::log_error!("Unable to send mail to {}: {}", dest, e);
            } else {
                eprintln!("Unable to send mail to {}: {}", dest, e);
            }
            return false;
        }
    };
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(body.as_bytes());
        // dropping stdin closes the pipe so the mailer sees EOF
    }
    match child.wait() {
        Ok(_) => true,
        Err(e) => {
            if use_logging {
                crate::log_error!("Problems sending mail to {}: {}", dest, e);
            } else {
                eprintln!("Problems sending mail to {}: {}", dest, e);
            }
            false
        }
    }
}

//! Process identity used by file names, headers and mail subjects.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

lazy_static! {
    static ref HOSTNAME: String = read_hostname();
    static ref USER_NAME: String = read_user_name();
    static ref PROGRAM_NAME: RwLock<Option<String>> = RwLock::new(None);
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);

fn read_hostname() -> String {
    let mut buf = [0u8; 256];
    let r = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if r != 0 {
        return "(unknown)".to_string();
    }
    let len = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    if len == 0 {
        return "(unknown)".to_string();
    }
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

fn read_user_name() -> String {
    match std::env::var("USER") {
        Ok(user) if !user.is_empty() => user,
        _ => "invalid-user".to_string(),
    }
}

#[inline]
pub fn hostname() -> &'static str {
    HOSTNAME.as_str()
}

#[inline]
pub fn user_name() -> &'static str {
    USER_NAME.as_str()
}

/// Record the short program name (basename of `argv0`) and mark logging as initialized.
pub fn init_logging_utilities(argv0: &str) {
    let name = basename(argv0).to_string();
    PROGRAM_NAME.write().replace(name);
    INITIALIZED.store(true, Ordering::Release);
}

/// Undo [init_logging_utilities()], messages go to stderr again.
pub fn shutdown_logging_utilities() {
    PROGRAM_NAME.write().take();
    INITIALIZED.store(false, Ordering::Release);
}

#[inline]
pub fn is_logging_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Short program name, falls back to the basename of the running executable.
pub fn program_short_name() -> String {
    if let Some(name) = PROGRAM_NAME.read().as_ref() {
        return name.clone();
    }
    match std::env::args().next() {
        Some(arg0) => basename(&arg0).to_string(),
        None => "UNKNOWN".to_string(),
    }
}

#[inline]
pub fn thread_id() -> u32 {
    #[cfg(target_os = "linux")]
    {
        unsafe { libc::syscall(libc::SYS_gettid) as u32 }
    }
    #[cfg(not(target_os = "linux"))]
    {
        std::process::id()
    }
}

#[inline]
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Unbuffered write of the whole buffer to fd 2, ignoring errors.
pub fn write_to_stderr(buf: &[u8]) {
    let mut off = 0;
    while off < buf.len() {
        let r = unsafe {
            libc::write(
                libc::STDERR_FILENO,
                buf[off..].as_ptr() as *const libc::c_void,
                buf.len() - off,
            )
        };
        if r > 0 {
            off += r as usize;
        } else if r < 0 && std::io::Error::last_os_error().kind() == std::io::ErrorKind::Interrupted {
            continue;
        } else {
            return;
        }
    }
}

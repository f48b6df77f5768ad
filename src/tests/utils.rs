use crate::*;
use std::fs::{read_dir, read_to_string, File};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

pub const TEST_LOCK_FILE: &str = "/tmp/logsmith_test_lock";

pub const TEST_DIR: &str = "/tmp/logsmith_test";

pub const TEST_PROGRAM: &str = "logsmith_test";

macro_rules! lock_file {
    () => {
        // NOTE: use one {} to expose the guard into context
        let lock_fd = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open($crate::tests::utils::TEST_LOCK_FILE)
            .unwrap();
        let _guard = fmutex::lock_exclusive(&lock_fd).unwrap();
    };
}
pub(crate) use lock_file;

/// Fresh directory under TEST_DIR, every message flushed at once, nothing echoed to
/// stderr, FATAL does not abort.
pub fn setup_test_logger(name: &str) -> PathBuf {
    let dir = Path::new(TEST_DIR).join(name);
    let _ = std::fs::remove_dir_all(&dir);
    reset_vmodule();
    Builder::new()
        .program_name(TEST_PROGRAM)
        .log_dir(&dir)
        .log_buf_level(None)
        .stderr_threshold(None)
        .test()
        .build()
        .expect("setup");
    reset_log_destinations();
    reset_fatal_state();
    dir
}

/// Content of the newest file of `severity`, read through its symlink.
pub fn read_log(dir: &Path, severity: Severity) -> String {
    let link = dir.join(format!("{}.{}", TEST_PROGRAM, severity));
    read_to_string(&link).unwrap_or_default()
}

/// Log files of `severity` in `dir`, symlinks excluded.
pub fn log_files(dir: &Path, severity: Severity) -> Vec<PathBuf> {
    let marker = format!(".log.{}.", severity);
    let mut files: Vec<PathBuf> = match read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| !p.is_symlink())
            .filter(|p| p.to_string_lossy().contains(&marker))
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// Redirect fd 2 into a file until finished.
pub struct CaptureStderr {
    saved_fd: i32,
    path: PathBuf,
}

impl CaptureStderr {
    pub fn new(name: &str) -> Self {
        let path = PathBuf::from(format!("/tmp/logsmith_stderr_{}", name));
        let f = File::create(&path).unwrap();
        let saved_fd = unsafe { libc::dup(libc::STDERR_FILENO) };
        assert!(saved_fd >= 0);
        unsafe {
            libc::dup2(f.as_raw_fd(), libc::STDERR_FILENO);
        }
        Self { saved_fd, path }
    }

    fn restore(&mut self) {
        if self.saved_fd >= 0 {
            unsafe {
                libc::dup2(self.saved_fd, libc::STDERR_FILENO);
                libc::close(self.saved_fd);
            }
            self.saved_fd = -1;
        }
    }

    /// Stop capturing and return what was written.
    pub fn finish(mut self) -> String {
        self.restore();
        read_to_string(&self.path).unwrap()
    }
}

impl Drop for CaptureStderr {
    fn drop(&mut self) {
        self.restore();
    }
}

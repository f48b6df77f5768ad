use crate::{
    config::config,
    severity::Severity,
    time::LogTime,
    utils::{hostname, program_short_name, user_name},
};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::os::unix::fs::{symlink, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A missing file is created at most once per this many writes.
pub const ROLLOVER_ATTEMPT_FREQUENCY: u32 = 0x20;

/// Flush once this many bytes are buffered, regardless of the deadline.
const FLUSH_BYTES: u64 = 1_000_000;

/// Per-severity log file with size based rollover.
///
/// File names look like `<base><ext><YYYYMMDD-HHMMSS>.<pid>`, and a
/// `<program>.<SEVERITY>` symlink in the same directory points at the newest one.
pub struct LogFileObject {
    severity: Severity,
    inner: Mutex<LogFileInner>,
}

struct LogFileInner {
    base_filename_selected: bool,
    base_filename: String,
    symlink_basename: String,
    filename_extension: String,
    file: Option<BufWriter<File>>,
    file_path: Option<PathBuf>,
    bytes_since_flush: u64,
    file_length: u64,
    rollover_attempt: u32,
    next_flush_time: Instant,
    stop_writing: bool,
    /// Process that opened `file`.
    pid: u32,
}

pub(crate) fn open_file(path: &Path) -> std::io::Result<File> {
    // std opens with O_CLOEXEC
    OpenOptions::new().write(true).create_new(true).mode(0o664).open(path)
}

fn logging_directories() -> Vec<PathBuf> {
    match config().log_dir.as_ref() {
        Some(dir) => vec![dir.clone()],
        None => vec![std::env::temp_dir(), PathBuf::from("./")],
    }
}

#[inline]
fn is_disk_full(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::ENOSPC)
}

impl LogFileObject {
    /// `base_filename` of None derives the name from program, host and user.
    pub fn new(severity: Severity, base_filename: Option<&str>) -> Self {
        let inner = LogFileInner {
            base_filename_selected: base_filename.is_some(),
            base_filename: base_filename.unwrap_or("").to_string(),
            symlink_basename: program_short_name(),
            filename_extension: String::new(),
            file: None,
            file_path: None,
            bytes_since_flush: 0,
            file_length: 0,
            rollover_attempt: ROLLOVER_ATTEMPT_FREQUENCY - 1,
            next_flush_time: Instant::now(),
            stop_writing: false,
            pid: std::process::id(),
        };
        Self { severity, inner: Mutex::new(inner) }
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// An empty base name turns this writer into a no-op.
    pub fn set_basename(&self, basename: &str) {
        let mut inner = self.inner.lock();
        inner.base_filename_selected = true;
        if inner.base_filename != basename {
            inner.close();
            inner.base_filename = basename.to_string();
        }
    }

    /// Go back to names derived from program, host and user.
    pub fn reset_basename(&self) {
        let mut inner = self.inner.lock();
        inner.close();
        inner.base_filename_selected = false;
        inner.base_filename.clear();
    }

    pub fn set_extension(&self, ext: &str) {
        let mut inner = self.inner.lock();
        if inner.filename_extension != ext {
            inner.close();
            inner.filename_extension = ext.to_string();
        }
    }

    pub fn set_symlink_basename(&self, symlink_basename: &str) {
        self.inner.lock().symlink_basename = symlink_basename.to_string();
    }

    pub fn flush(&self) {
        self.inner.lock().flush_unlocked();
    }

    /// Close the current file, the next write starts a new one.
    pub fn reopen(&self) {
        let mut inner = self.inner.lock();
        inner.close();
        inner.stop_writing = false;
    }

    /// Bytes written to the current file, header included.
    pub fn log_size(&self) -> u64 {
        self.inner.lock().file_length
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        self.inner.lock().file_path.clone()
    }

    pub fn write(&self, force_flush: bool, time: &LogTime, message: &[u8]) {
        let mut inner = self.inner.lock();
        inner.write(self.severity, force_flush, time, message);
    }
}

impl LogFileInner {
    fn close(&mut self) {
        if let Some(mut f) = self.file.take() {
            let _ = f.flush();
        }
        self.file_path = None;
        self.file_length = 0;
        self.bytes_since_flush = 0;
        self.rollover_attempt = ROLLOVER_ATTEMPT_FREQUENCY - 1;
    }

    fn flush_unlocked(&mut self) {
        if let Some(f) = self.file.as_mut() {
            if let Err(e) = f.flush() {
                if is_disk_full(&e) && config().stop_logging_if_full_disk {
                    self.stop_writing = true;
                } else {
                    eprintln!("flush log file {:?} failed: {:?}", self.file_path, e);
                }
            }
            self.bytes_since_flush = 0;
        }
        self.next_flush_time = Instant::now() + Duration::from_secs(config().log_buf_secs as u64);
    }

    fn create_logfile(&mut self, severity: Severity, time_pid: &str) -> std::io::Result<()> {
        let filename = format!("{}{}{}", self.base_filename, self.filename_extension, time_pid);
        let path = PathBuf::from(&filename);
        let f = open_file(&path)?;
        self.file = Some(BufWriter::new(f));

        if !self.symlink_basename.is_empty() {
            let linkname = format!("{}.{}", self.symlink_basename, severity);
            let (dir, target) = match filename.rfind('/') {
                Some(pos) => (&filename[..pos + 1], &filename[pos + 1..]),
                None => ("", filename.as_str()),
            };
            // relative target, so the directory can be moved as a whole
            let linkpath = format!("{}{}", dir, linkname);
            let _ = std::fs::remove_file(&linkpath);
            let _ = symlink(target, &linkpath);

            if let Some(link_dir) = config().log_link.as_ref() {
                let linkpath = link_dir.join(&linkname);
                let _ = std::fs::remove_file(&linkpath);
                let abs = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                let _ = symlink(&abs, &linkpath);
            }
        }
        self.file_path = Some(path);
        Ok(())
    }

    fn open_new(&mut self, severity: Severity, time: &LogTime) -> bool {
        self.pid = std::process::id();
        let time_pid = format!("{}.{}", time.format("%Y%m%d-%H%M%S"), self.pid);
        if self.base_filename_selected {
            if let Err(e) = self.create_logfile(severity, &time_pid) {
                eprintln!(
                    "Could not create log file {}{}{}: {}",
                    self.base_filename, self.filename_extension, time_pid, e
                );
                return false;
            }
        } else {
            // <program>.<host>.<user>.log.<SEVERITY>.
            let stripped =
                format!("{}.{}.{}.log.{}.", program_short_name(), hostname(), user_name(), severity);
            let mut last_err = None;
            for dir in logging_directories() {
                self.base_filename = dir.join(&stripped).to_string_lossy().into_owned();
                match self.create_logfile(severity, &time_pid) {
                    Ok(()) => {
                        last_err = None;
                        break;
                    }
                    Err(e) => last_err = Some(e),
                }
            }
            if let Some(e) = last_err {
                eprintln!("Could not create logging file {}{}: {}", stripped, time_pid, e);
                return false;
            }
        }

        let header = format!(
            "Log file created at: {}\nRunning on machine: {}\n\
             Log line format: [IWEF]mmdd hh:mm:ss.uuuuuu threadid file:line] msg\n",
            time.format("%Y/%m/%d %H:%M:%S"),
            hostname()
        );
        if let Some(f) = self.file.as_mut() {
            let _ = f.write_all(header.as_bytes());
        }
        self.file_length += header.len() as u64;
        self.bytes_since_flush += header.len() as u64;
        true
    }

    fn write(&mut self, severity: Severity, force_flush: bool, time: &LogTime, message: &[u8]) {
        if self.base_filename_selected && self.base_filename.is_empty() {
            return;
        }
        let conf = config();

        if self.file.is_some() && self.pid != std::process::id() {
            // forked: leave the parent's buffered bytes and file alone
            if let Some(f) = self.file.take() {
                let _ = f.into_parts();
            }
            self.close();
        } else if (self.file_length >> 20) >= conf.max_log_size_mb() {
            self.close();
        }

        if self.file.is_none() {
            // flushing has nothing to flush, do not create a file for it
            if message.is_empty() {
                return;
            }
            self.rollover_attempt += 1;
            if self.rollover_attempt != ROLLOVER_ATTEMPT_FREQUENCY {
                return;
            }
            self.rollover_attempt = 0;
            if !self.open_new(severity, time) {
                return;
            }
        }

        if self.stop_writing {
            if Instant::now() >= self.next_flush_time {
                // probe again on the next call
                self.stop_writing = false;
            }
            return;
        }

        if let Some(f) = self.file.as_mut() {
            match f.write_all(message) {
                Ok(()) => {
                    self.file_length += message.len() as u64;
                    self.bytes_since_flush += message.len() as u64;
                }
                Err(e) => {
                    if conf.stop_logging_if_full_disk && is_disk_full(&e) {
                        self.stop_writing = true;
                        self.next_flush_time =
                            Instant::now() + Duration::from_secs(conf.log_buf_secs as u64);
                        return;
                    }
                    eprintln!("write log file {:?} failed: {:?}", self.file_path, e);
                }
            }
        }

        if force_flush
            || self.bytes_since_flush >= FLUSH_BYTES
            || Instant::now() >= self.next_flush_time
        {
            self.flush_unlocked();
        }
    }
}

impl Drop for LogFileObject {
    fn drop(&mut self) {
        self.inner.lock().close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{update_config, Config};
    use crate::tests::utils::lock_file;
    use std::fs;
    use std::thread;

    fn fresh_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/logsmith_file_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create test dir");
        dir
    }

    fn count_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_type().unwrap().is_file())
            .count()
    }

    #[test]
    fn test_explicit_basename() {
        let dir = fresh_dir("explicit");
        let base = format!("{}/explicit.", dir.display());
        let file = LogFileObject::new(Severity::Warning, Some(&base));
        file.set_symlink_basename("explicit_prog");
        let now = LogTime::now();
        file.write(true, &now, b"first line\n");
        file.write(true, &now, b"second line\n");

        let path = file.current_path().expect("file created on first write");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let expect = format!("explicit.{}.{}", now.format("%Y%m%d-%H%M%S"), std::process::id());
        assert_eq!(name, expect);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Log file created at: "));
        assert!(content.contains("Log line format: [IWEF]mmdd hh:mm:ss.uuuuuu threadid file:line] msg\n"));
        assert!(content.ends_with("first line\nsecond line\n"));
        assert_eq!(file.log_size(), content.len() as u64);

        let link = dir.join("explicit_prog.WARNING");
        let target = fs::read_link(&link).unwrap();
        assert_eq!(target, PathBuf::from(&name));
    }

    #[test]
    fn test_empty_basename_is_noop() {
        let file = LogFileObject::new(Severity::Info, Some(""));
        let now = LogTime::now();
        for _ in 0..(ROLLOVER_ATTEMPT_FREQUENCY * 2) {
            file.write(true, &now, b"dropped\n");
        }
        assert!(file.current_path().is_none());
        assert_eq!(file.log_size(), 0);
    }

    #[test]
    fn test_retry_cadence_after_failure() {
        // the directory is missing, so creation fails
        let _ = fs::remove_dir_all("/tmp/logsmith_file_missing");
        let file = LogFileObject::new(Severity::Info, Some("/tmp/logsmith_file_missing/dir/x."));
        let now = LogTime::now();
        file.write(true, &now, b"a\n");
        assert!(file.current_path().is_none());
        let dir = fresh_dir("missing");
        fs::create_dir_all(dir.join("dir")).unwrap();
        // the next attempt only happens after a full cadence cycle
        for _ in 0..(ROLLOVER_ATTEMPT_FREQUENCY - 1) {
            file.write(true, &now, b"b\n");
            assert!(file.current_path().is_none());
        }
        file.write(true, &now, b"c\n");
        assert!(file.current_path().is_some());
    }

    #[test]
    fn test_extension_change_closes_file() {
        let dir = fresh_dir("ext");
        let file = LogFileObject::new(Severity::Error, Some(&format!("{}/ext.", dir.display())));
        file.set_symlink_basename("");
        file.write(true, &LogTime::from_secs(1_000_000_000), b"one\n");
        let first = file.current_path().unwrap();
        file.set_extension("log.");
        assert!(file.current_path().is_none());
        file.write(true, &LogTime::from_secs(1_000_000_001), b"two\n");
        let second = file.current_path().unwrap();
        assert_ne!(first, second);
        assert!(second.file_name().unwrap().to_string_lossy().starts_with("ext.log."));
        assert_eq!(count_files(&dir), 2);
    }

    #[test]
    fn test_empty_write_does_not_create() {
        let dir = fresh_dir("flush_only");
        let file = LogFileObject::new(Severity::Info, Some(&format!("{}/f.", dir.display())));
        for _ in 0..(ROLLOVER_ATTEMPT_FREQUENCY * 2) {
            file.write(true, &LogTime::now(), b"");
        }
        assert_eq!(count_files(&dir), 0);
    }

    #[test]
    fn test_rollover_by_size() {
        lock_file!();
        update_config(|c| c.max_log_size = 1);
        let dir = fresh_dir("rollover");
        let file = LogFileObject::new(Severity::Info, Some(&format!("{}/roll.", dir.display())));
        file.set_symlink_basename("roll");
        let mut line = vec![b'x'; 1023];
        line.push(b'\n');
        let mut first = None;
        for i in 0..1100 {
            file.write(false, &LogTime::from_secs(1_700_000_000 + i), &line);
            first.get_or_insert(file.current_path().unwrap());
        }
        file.flush();
        update_config(|c| c.max_log_size = Config::default().max_log_size);

        let first = first.unwrap();
        let second = file.current_path().unwrap();
        assert_ne!(first, second);
        assert_eq!(count_files(&dir), 2);
        assert!(fs::metadata(&first).unwrap().len() >= 1 << 20);
        let target = fs::read_link(dir.join("roll.INFO")).unwrap();
        assert_eq!(target, PathBuf::from(second.file_name().unwrap()));
    }

    fn swap_file(file: &LogFileObject, path: &Path) {
        let f = OpenOptions::new().write(true).open(path).unwrap();
        let mut inner = file.inner.lock();
        inner.file = Some(BufWriter::new(f));
        inner.file_path = Some(path.to_path_buf());
    }

    #[test]
    fn test_disk_full_drop_mode() {
        lock_file!();
        update_config(|c| {
            c.stop_logging_if_full_disk = true;
            c.log_buf_secs = 1;
        });
        let dir = fresh_dir("disk_full");
        let file = LogFileObject::new(Severity::Info, Some(&format!("{}/full.", dir.display())));
        file.set_symlink_basename("");
        swap_file(&file, Path::new("/dev/full"));

        // a short line fails only when flushed
        file.write(true, &LogTime::now(), b"short\n");
        assert!(file.inner.lock().stop_writing);
        let size = file.log_size();
        file.write(true, &LogTime::now(), b"dropped\n");
        assert_eq!(file.log_size(), size);

        // past the deadline the first call only re-arms, a long line fails in write
        thread::sleep(Duration::from_millis(1100));
        let long = vec![b'z'; 10000];
        file.write(false, &LogTime::now(), &long);
        assert!(!file.inner.lock().stop_writing);
        file.write(false, &LogTime::now(), &long);
        assert!(file.inner.lock().stop_writing);

        // space is back
        let target = dir.join("recovered");
        fs::write(&target, b"").unwrap();
        swap_file(&file, &target);
        thread::sleep(Duration::from_millis(1100));
        file.write(true, &LogTime::now(), b"lost while probing\n");
        file.write(true, &LogTime::now(), b"written again\n");
        update_config(|c| {
            c.stop_logging_if_full_disk = false;
            c.log_buf_secs = Config::default().log_buf_secs;
        });
        assert!(!file.inner.lock().stop_writing);
        assert_eq!(fs::read_to_string(&target).unwrap(), "written again\n");
    }
}

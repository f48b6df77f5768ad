use super::utils::*;
use crate::*;

#[test]
fn test_log_crate_bridge() {
    lock_file!();
    let dir = setup_test_logger("bridge");
    log::info!("from the log crate");
    log::warn!("warned through log");
    log::debug!("debug hidden");
    set_vlog_level("test_bridge", 1);
    log::debug!("debug shown");
    log::trace!("trace hidden");
    log::logger().flush();

    let info = read_log(&dir, Severity::Info);
    assert!(info.contains("test_bridge.rs:"));
    assert!(info.contains("] from the log crate\n"));
    assert!(info.contains("] debug shown\n"));
    assert!(!info.contains("debug hidden"));
    assert!(!info.contains("trace hidden"));
    assert!(read_log(&dir, Severity::Warning).contains("] warned through log\n"));
}

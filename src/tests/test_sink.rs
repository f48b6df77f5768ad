use super::utils::*;
use crate::*;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct CollectSink {
    messages: Mutex<Vec<String>>,
}

impl LogSink for CollectSink {
    fn send(
        &self, severity: Severity, full_filename: &str, base_filename: &str, line: u32,
        _time: &LogTime, message: &str,
    ) {
        assert!(full_filename.ends_with(base_filename));
        self.messages.lock().push(format!("{}|{}|{}|{}", severity, base_filename, line, message));
    }
}

struct OrderSink {
    name: &'static str,
    order: Arc<Mutex<Vec<&'static str>>>,
}

impl LogSink for OrderSink {
    fn send(&self, _: Severity, _: &str, _: &str, _: u32, _: &LogTime, _: &str) {
        self.order.lock().push(self.name);
    }
}

#[test]
fn test_sink_add_remove() {
    lock_file!();
    setup_test_logger("sink");
    let count = log_sink_count();
    let collector = Arc::new(CollectSink::default());
    let sink: Arc<dyn LogSink> = collector.clone();
    add_log_sink(sink.clone());
    assert_eq!(log_sink_count(), count + 1);

    let line = line!() + 1;
    log_warning!("to every sink");
    remove_log_sink(&sink);
    assert_eq!(log_sink_count(), count);
    log_warning!("after removal");

    let got = collector.messages.lock().clone();
    assert_eq!(got, vec![format!("WARNING|test_sink.rs|{}|to every sink", line)]);
}

#[test]
fn test_sink_order() {
    lock_file!();
    setup_test_logger("sink_order");
    let order = Arc::new(Mutex::new(Vec::new()));
    let first: Arc<dyn LogSink> = Arc::new(OrderSink { name: "first", order: order.clone() });
    let second: Arc<dyn LogSink> = Arc::new(OrderSink { name: "second", order: order.clone() });
    add_log_sink(first.clone());
    add_log_sink(second.clone());
    log_info!("ordered");
    remove_log_sink(&first);
    remove_log_sink(&second);
    assert_eq!(*order.lock(), vec!["second", "first"]);
}

#[test]
fn test_log_to_sink() {
    lock_file!();
    let dir = setup_test_logger("log_to_sink");
    let local = CollectSink::default();
    let local_ref: &dyn LogSink = &local;
    log_to_sink!(Some(local_ref), Severity::Info, "sink and file");
    log_to_sink_but_not_to_logfile!(Some(local_ref), Severity::Info, "sink only");
    log_to_sink!(None, Severity::Info, "file only");
    log_to_sink_but_not_to_logfile!(None, Severity::Info, "nowhere");

    let got = local.messages.lock().clone();
    assert_eq!(got.len(), 2);
    assert!(got[0].ends_with("|sink and file"));
    assert!(got[1].ends_with("|sink only"));

    let info = read_log(&dir, Severity::Info);
    assert!(info.contains("sink and file\n"));
    assert!(!info.contains("sink only"));
    assert!(info.contains("file only\n"));
    assert!(!info.contains("nowhere"));
}

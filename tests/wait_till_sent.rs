use crossfire::{MTx, Rx};
use logsmith::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

enum Job {
    Line(String),
    Barrier(MTx<()>),
}

/// Delivers on a worker thread, slower than the logging side.
struct WorkerSink {
    tx: MTx<Job>,
    delivered: Arc<Mutex<Vec<String>>>,
}

impl WorkerSink {
    fn new() -> Self {
        let (tx, rx) = crossfire::mpsc::bounded_blocking(100);
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let worker_delivered = delivered.clone();
        thread::spawn(move || worker(rx, worker_delivered));
        Self { tx, delivered }
    }
}

fn worker(rx: Rx<Job>, delivered: Arc<Mutex<Vec<String>>>) {
    while let Ok(job) = rx.recv() {
        match job {
            Job::Line(line) => {
                thread::sleep(Duration::from_millis(20));
                delivered.lock().push(line);
            }
            Job::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
}

impl LogSink for WorkerSink {
    fn send(
        &self, severity: Severity, _full_filename: &str, base_filename: &str, line: u32,
        time: &LogTime, message: &str,
    ) {
        let _ = self.tx.send(Job::Line(sink_to_string(severity, base_filename, line, time, message)));
    }

    fn wait_till_sent(&self) {
        let (done_tx, done_rx) = crossfire::mpsc::bounded_blocking(1);
        if self.tx.send(Job::Barrier(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

#[test]
fn test_wait_till_sent() {
    let dir = "/tmp/logsmith_it/wait_till_sent";
    let _ = std::fs::remove_dir_all(dir);
    Builder::new()
        .program_name("wait_till_sent")
        .log_dir(dir)
        .test()
        .build()
        .expect("setup");

    let sink = Arc::new(WorkerSink::new());
    let delivered = sink.delivered.clone();
    let registered: Arc<dyn LogSink> = sink;
    add_log_sink(registered.clone());
    for i in 0..5 {
        log_info!("slow delivery {}", i);
        // delivered before the log statement returned
        let got = delivered.lock();
        assert_eq!(got.len(), i + 1);
        assert!(got[i].ends_with(&format!("] slow delivery {}", i)), "{}", got[i]);
    }
    remove_log_sink(&registered);
    log_info!("not delivered");
    assert_eq!(delivered.lock().len(), 5);
}

#![allow(dead_code)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use minicron::{PeriodicRunner, RunnerOptions};

/// Records the start time of every callback invocation
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<AtomicUsize>,
    stamps: Arc<Mutex<Vec<Instant>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) {
        self.stamps.lock().unwrap().push(Instant::now());
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stamps(&self) -> Vec<Instant> {
        self.stamps.lock().unwrap().clone()
    }

    /// Start a runner whose callback only records
    pub fn start(&self, period_ms: u32) -> PeriodicRunner {
        let recorder = self.clone();
        PeriodicRunner::start_with_options(
            RunnerOptions::named("test-runner"),
            period_ms,
            move || {
                recorder.record();
                Ok(())
            },
        )
        .expect("runner should start")
    }
}

/// Poll `condition` until it holds or `timeout` elapses. Returns whether it held.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

// gradient/diagnostics.rs - De-duplicated error reporting
//
// Cyclic references are hit once per sample, and a batch query can hit the
// same cycle thousands of times. The sink logs the first report for each
// key and only counts the rest.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct DiagnosticSink {
    counts: Mutex<FxHashMap<String, u64>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` at error level the first time `key` is reported.
    /// Returns true if this call emitted the log line.
    pub fn error_once(&self, key: &str, message: &str) -> bool {
        let first = {
            let mut counts = self.counts.lock();
            match counts.get_mut(key) {
                Some(count) => {
                    *count += 1;
                    false
                }
                None => {
                    counts.insert(key.to_string(), 1);
                    true
                }
            }
        };
        if first {
            log::error!(target: "gradient_signal", "{}", message);
        }
        first
    }

    /// How many times `key` has been reported (logged or suppressed).
    pub fn count(&self, key: &str) -> u64 {
        self.counts.lock().get(key).copied().unwrap_or(0)
    }

    pub fn reported(&self, key: &str) -> bool {
        self.count(key) > 0
    }

    /// Forget all keys so the next report of each is logged again.
    pub fn reset(&self) {
        self.counts.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_once_per_key() {
        let sink = DiagnosticSink::new();
        assert!(sink.error_once("cycle", "first"));
        assert!(!sink.error_once("cycle", "second"));
        assert!(!sink.error_once("cycle", "third"));
        assert!(sink.error_once("other", "different key"));

        assert_eq!(sink.count("cycle"), 3);
        assert_eq!(sink.count("other"), 1);
        assert!(!sink.reported("never"));
    }

    #[test]
    fn reset_rearms_keys() {
        let sink = DiagnosticSink::new();
        sink.error_once("cycle", "first");
        sink.reset();
        assert_eq!(sink.count("cycle"), 0);
        assert!(sink.error_once("cycle", "after reset"));
    }
}

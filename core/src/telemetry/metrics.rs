use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters for the refresh and frame loops.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub refresh_cycles: usize,
    pub retrieval_errors: usize,
    pub frames: usize,
    pub picks: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_refresh(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.refresh_cycles += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.retrieval_errors += 1;
        }
    }

    pub fn record_frame(&self, picked: bool) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames += 1;
            if picked {
                metrics.picks += 1;
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_refresh();
        metrics.record_error();
        metrics.record_frame(true);
        metrics.record_frame(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.refresh_cycles, 1);
        assert_eq!(snapshot.retrieval_errors, 1);
        assert_eq!(snapshot.frames, 2);
        assert_eq!(snapshot.picks, 1);
    }
}

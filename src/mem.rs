use std::time::{Duration, Instant};
use sysinfo::{System, SystemExt};

const REFRESH_EVERY: Duration = Duration::from_millis(500);

/// Per-run watch over the in-memory accumulators: logs a single warning the
/// first time available RAM drops under `threshold` (fraction of total).
/// The system is sampled at most every `REFRESH_EVERY`.
pub struct LowMemoryWatch {
    threshold: f64,
    warned: bool,
    sys: Option<System>,
    last_check: Option<Instant>,
}

impl LowMemoryWatch {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, warned: false, sys: None, last_check: None }
    }

    /// available / total, 1.0 when the total is unknown.
    fn available_fraction(&mut self) -> Option<f64> {
        let now = Instant::now();
        if self.last_check.map_or(false, |t| now.duration_since(t) < REFRESH_EVERY) {
            return None;
        }
        self.last_check = Some(now);
        let sys = self.sys.get_or_insert_with(System::new);
        sys.refresh_memory();
        let total = sys.total_memory() as f64;
        Some(if total > 0.0 { (sys.available_memory() as f64 / total).clamp(0.0, 1.0) } else { 1.0 })
    }

    /// Call once per batch. `tracked` is the current number of accumulator entries.
    pub fn check(&mut self, tracked: usize) {
        if self.warned || self.threshold <= 0.0 {
            return;
        }
        let Some(available) = self.available_fraction() else { return };
        if available < self.threshold {
            self.warned = true;
            tracing::warn!(
                tracked,
                available,
                "available memory is low while aggregating in memory; consider loading into SQLite and using summary-db"
            );
        }
    }
}

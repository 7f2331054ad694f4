// Usage counters
//
// Lock-free counters for the render hook and the loader. They are only
// reported, never consulted for decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Metrics {
    /// Immediate operands offered to the symbolizer
    pub operands_seen: AtomicU64,

    /// Operands replaced by a port name
    pub operands_symbolized: AtomicU64,

    /// Loads that ended with a device applied
    pub loads_applied: AtomicU64,

    /// Loads that ended without a device (cancelled, failed or "no device")
    pub loads_abandoned: AtomicU64,

    /// Total time spent parsing configuration files in microseconds
    pub parse_time_us: AtomicU64,

    /// Number of timed parses
    pub parses: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            operands_seen: AtomicU64::new(0),
            operands_symbolized: AtomicU64::new(0),
            loads_applied: AtomicU64::new(0),
            loads_abandoned: AtomicU64::new(0),
            parse_time_us: AtomicU64::new(0),
            parses: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_operand(&self, symbolized: bool) {
        self.operands_seen.fetch_add(1, Ordering::Relaxed);
        if symbolized {
            self.operands_symbolized.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_load(&self, applied: bool) {
        let counter = if applied {
            &self.loads_applied
        } else {
            &self.loads_abandoned
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_time(&self, duration: Duration) {
        self.parse_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.parses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Share of rendered immediates that were symbolized, 0.0 when none were seen
    pub fn hit_ratio(&self) -> f64 {
        let seen = self.operands_seen.load(Ordering::Relaxed);
        if seen == 0 {
            return 0.0;
        }
        self.operands_symbolized.load(Ordering::Relaxed) as f64 / seen as f64
    }

    pub fn avg_parse_time_ms(&self) -> f64 {
        let parses = self.parses.load(Ordering::Relaxed);
        if parses == 0 {
            return 0.0;
        }
        self.parse_time_us.load(Ordering::Relaxed) as f64 / parses as f64 / 1000.0
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "Uptime {:.2}s: {} loads applied, {} abandoned, avg parse {:.2}ms",
            self.uptime().as_secs_f64(),
            self.loads_applied.load(Ordering::Relaxed),
            self.loads_abandoned.load(Ordering::Relaxed),
            self.avg_parse_time_ms()
        );
        tracing::info!(
            "Operands: {} seen, {} symbolized ({:.1}%)",
            self.operands_seen.load(Ordering::Relaxed),
            self.operands_symbolized.load(Ordering::Relaxed),
            self.hit_ratio() * 100.0
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

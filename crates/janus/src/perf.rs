//! Performance monitor (§2 row 8, §4.8, §5 budget).
//!
//! Guarded by a `Mutex` per counter set rather than raw atomics, because
//! percentile computation needs the whole sample set, not a running sum —
//! matching §5's "per-query counters may be atomic" as a permission, not a
//! mandate.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Percentiles {
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
}

#[derive(Default)]
struct Samples {
    values: Vec<u64>,
}

/// Per-`QueryKey`-variant latency samples plus a global cache hit/miss
/// counter. Recording a sample cannot fail.
pub struct PerfMonitor {
    samples: Mutex<HashMap<&'static str, Samples>>,
    hits: Mutex<u64>,
    misses: Mutex<u64>,
}

impl Default for PerfMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfMonitor {
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(HashMap::new()),
            hits: Mutex::new(0),
            misses: Mutex::new(0),
        }
    }

    pub fn record(&self, kind: &'static str, execution_time_ns: u64, cache_hit: bool) {
        if cache_hit {
            *self.hits.lock().expect("perf monitor mutex poisoned") += 1;
        } else {
            *self.misses.lock().expect("perf monitor mutex poisoned") += 1;
        }
        self.samples
            .lock()
            .expect("perf monitor mutex poisoned")
            .entry(kind)
            .or_default()
            .values
            .push(execution_time_ns);
    }

    pub fn percentiles(&self, kind: &str) -> Option<Percentiles> {
        let guard = self.samples.lock().expect("perf monitor mutex poisoned");
        let samples = guard.get(kind)?;
        if samples.values.is_empty() {
            return None;
        }
        let mut sorted = samples.values.clone();
        sorted.sort_unstable();
        let pick = |p: f64| {
            let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
            sorted[idx]
        };
        Some(Percentiles {
            p50: pick(0.50),
            p95: pick(0.95),
            p99: pick(0.99),
        })
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let hits = *self.hits.lock().expect("perf monitor mutex poisoned");
        let misses = *self.misses.lock().expect("perf monitor mutex poisoned");
        let total = hits + misses;
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }

    pub fn hits(&self) -> u64 {
        *self.hits.lock().expect("perf monitor mutex poisoned")
    }

    pub fn misses(&self) -> u64 {
        *self.misses.lock().expect("perf monitor mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_of_empty_kind_is_none() {
        let m = PerfMonitor::new();
        assert_eq!(m.percentiles("TypeOf"), None);
    }

    #[test]
    fn hit_rate_tracks_recorded_samples() {
        let m = PerfMonitor::new();
        m.record("TypeOf", 100, false);
        m.record("TypeOf", 5, true);
        m.record("TypeOf", 5, true);
        assert!((m.cache_hit_rate() - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn percentiles_are_sorted_order_statistics() {
        let m = PerfMonitor::new();
        for ns in [10, 20, 30, 40, 50] {
            m.record("Dispatch", ns, false);
        }
        let p = m.percentiles("Dispatch").unwrap();
        assert_eq!(p.p50, 30);
        assert_eq!(p.p99, 50);
    }
}

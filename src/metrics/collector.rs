use crate::metrics::snapshot::MetricsSnapshot;
use crate::result::{EndpointResult, FieldResult, ScrapeResult};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct MetricsCollector {
    cycles_started: Arc<AtomicU64>,
    cycles_completed: Arc<AtomicU64>,
    cycles_abandoned: Arc<AtomicU64>,
    cycles_overrun: Arc<AtomicU64>,
    endpoints_succeeded: Arc<AtomicU64>,
    endpoints_failed: Arc<AtomicU64>,
    fields_extracted: Arc<AtomicU64>,
    fields_failed: Arc<AtomicU64>,
    total_cycle_time_ms: Arc<AtomicU64>,
    last_cycle_time_ms: Arc<AtomicU64>,
    start_time: Arc<Instant>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            cycles_started: Arc::new(AtomicU64::new(0)),
            cycles_completed: Arc::new(AtomicU64::new(0)),
            cycles_abandoned: Arc::new(AtomicU64::new(0)),
            cycles_overrun: Arc::new(AtomicU64::new(0)),
            endpoints_succeeded: Arc::new(AtomicU64::new(0)),
            endpoints_failed: Arc::new(AtomicU64::new(0)),
            fields_extracted: Arc::new(AtomicU64::new(0)),
            fields_failed: Arc::new(AtomicU64::new(0)),
            total_cycle_time_ms: Arc::new(AtomicU64::new(0)),
            last_cycle_time_ms: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(Instant::now()),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_cycles_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_cycles_abandoned(&self) {
        self.cycles_abandoned.fetch_add(1, Ordering::SeqCst);
    }

    /// Records a finished cycle. `interval` is the configured period; a cycle
    /// that took longer counts as an overrun.
    pub fn record_cycle(&self, result: &ScrapeResult, duration: Duration, interval: Duration) {
        let ms = duration.as_millis() as u64;
        self.cycles_completed.fetch_add(1, Ordering::SeqCst);
        self.total_cycle_time_ms.fetch_add(ms, Ordering::SeqCst);
        self.last_cycle_time_ms.store(ms, Ordering::SeqCst);
        if duration > interval {
            self.cycles_overrun.fetch_add(1, Ordering::SeqCst);
        }

        for endpoint in result.endpoints.values() {
            match endpoint {
                EndpointResult::Failure(_) => {
                    self.endpoints_failed.fetch_add(1, Ordering::SeqCst);
                }
                EndpointResult::Fields(fields) => {
                    self.endpoints_succeeded.fetch_add(1, Ordering::SeqCst);
                    for field in fields.values() {
                        match field {
                            FieldResult::Values(_) => {
                                self.fields_extracted.fetch_add(1, Ordering::SeqCst)
                            }
                            FieldResult::Error(_) => {
                                self.fields_failed.fetch_add(1, Ordering::SeqCst)
                            }
                        };
                    }
                }
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let completed = self.cycles_completed.load(Ordering::SeqCst);
        let succeeded = self.endpoints_succeeded.load(Ordering::SeqCst);
        let failed = self.endpoints_failed.load(Ordering::SeqCst);
        let total_time = self.total_cycle_time_ms.load(Ordering::SeqCst);

        let endpoint_success_rate = if succeeded + failed > 0 {
            (succeeded as f64 / (succeeded + failed) as f64) * 100.0
        } else {
            0.0
        };

        let avg_cycle_time_ms = if completed > 0 {
            total_time / completed
        } else {
            0
        };

        MetricsSnapshot {
            cycles_started: self.cycles_started.load(Ordering::SeqCst),
            cycles_completed: completed,
            cycles_abandoned: self.cycles_abandoned.load(Ordering::SeqCst),
            cycles_overrun: self.cycles_overrun.load(Ordering::SeqCst),
            endpoints_succeeded: succeeded,
            endpoints_failed: failed,
            fields_extracted: self.fields_extracted.load(Ordering::SeqCst),
            fields_failed: self.fields_failed.load(Ordering::SeqCst),
            endpoint_success_rate,
            avg_cycle_time_ms,
            last_cycle_time_ms: self.last_cycle_time_ms.load(Ordering::SeqCst),
            elapsed_seconds: self.start_time.elapsed().as_secs_f64(),
        }
    }
}

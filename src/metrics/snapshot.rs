use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_abandoned: u64,
    pub cycles_overrun: u64,
    pub endpoints_succeeded: u64,
    pub endpoints_failed: u64,
    pub fields_extracted: u64,
    pub fields_failed: u64,
    pub endpoint_success_rate: f64,
    pub avg_cycle_time_ms: u64,
    pub last_cycle_time_ms: u64,
    pub elapsed_seconds: f64,
}

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub readings_served: u64,
    pub generation_failures: u64,
    pub memory_usage_mb: f32,
    pub rng_mode: String,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    readings_served: Arc<AtomicU64>,
    generation_failures: Arc<AtomicU64>,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            readings_served: Arc::new(AtomicU64::new(0)),
            generation_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_served(&self) {
        self.readings_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.generation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_health(&self, rng_mode: &str) -> KernelHealth {
        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            readings_served: self.readings_served.load(Ordering::Relaxed),
            generation_failures: self.generation_failures.load(Ordering::Relaxed),
            memory_usage_mb: get_memory_usage_mb(),
            rng_mode: rng_mode.to_string(),
        }
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<u64>().ok());
            if let Some(kb) = rss_kb {
                return (kb as f32) / 1024.0; // KB -> MB
            }
        }
    }

    // Fallback approximatif
    12.0
}

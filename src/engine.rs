use crate::config::Config;
use crate::cycle::run_cycle;
use crate::error::{FetchError, LifecycleError};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::result::ScrapeResult;
use crate::store::ResultStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::sleep_until;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Running,
    Stopped,
}

/// Periodically scrapes the configured endpoints and keeps the latest result.
///
/// `NotStarted --start()--> Running --stop()--> Stopped`. An engine is started
/// at most once. Cycles start on a fixed-rate grid (`start + k * interval`)
/// whose first tick fires immediately; a cycle that outlasts the interval
/// causes the missed ticks to be skipped, so the next cycle waits for the next
/// grid point and cycles never overlap.
pub struct ScrapeEngine {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    store: ResultStore,
    metrics: Arc<MetricsCollector>,
    state_watcher: watch::Sender<EngineState>,
    cancel: CancellationToken,
}

impl ScrapeEngine {
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new()?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let (state_tx, _) = watch::channel(EngineState::NotStarted);

        Self {
            config: Arc::new(config),
            fetcher,
            store: ResultStore::new(),
            metrics: Arc::new(MetricsCollector::new()),
            state_watcher: state_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Spawns the scheduling loop on the current tokio runtime.
    ///
    /// Fails with [`LifecycleError::AlreadyStarted`] unless the engine is
    /// `NotStarted`; a stopped engine cannot be restarted.
    pub fn start(&self) -> Result<(), LifecycleError> {
        let handle = Handle::try_current().map_err(|_| LifecycleError::NoRuntime)?;

        let mut previous = EngineState::NotStarted;
        let started = self.state_watcher.send_if_modified(|state| {
            previous = *state;
            if *state == EngineState::NotStarted {
                *state = EngineState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(LifecycleError::AlreadyStarted(previous));
        }

        log::info!(
            "Starting scrape engine: {} endpoint(s) every {}s",
            self.config.endpoints.len(),
            self.config.interval.as_secs()
        );

        let scheduler = Scheduler {
            config: self.config.clone(),
            fetcher: self.fetcher.clone(),
            store: self.store.clone(),
            metrics: self.metrics.clone(),
            cancel: self.cancel.clone(),
        };
        handle.spawn(scheduler.run());
        Ok(())
    }

    /// Halts scheduling. A cycle in flight is abandoned: its requests are
    /// dropped and its result is never published.
    pub fn stop(&self) -> Result<(), LifecycleError> {
        let mut previous = EngineState::Running;
        let stopped = self.state_watcher.send_if_modified(|state| {
            previous = *state;
            if *state == EngineState::Running {
                *state = EngineState::Stopped;
                true
            } else {
                false
            }
        });
        if !stopped {
            return Err(LifecycleError::NotRunning(previous));
        }

        self.cancel.cancel();
        self.store.mark_stopped();
        log::info!("Scrape engine stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    pub fn state(&self) -> EngineState {
        *self.state_watcher.borrow()
    }

    /// Latest published snapshot; the "no data yet" sentinel before the first
    /// cycle completes.
    pub fn get_scrape_data(&self) -> Arc<ScrapeResult> {
        self.store.read()
    }

    pub fn watch_results(&self) -> watch::Receiver<Arc<ScrapeResult>> {
        self.store.subscribe()
    }

    pub fn watch_state(&self) -> watch::Receiver<EngineState> {
        self.state_watcher.subscribe()
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for ScrapeEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Scheduler {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    store: ResultStore,
    metrics: Arc<MetricsCollector>,
    cancel: CancellationToken,
}

impl Scheduler {
    async fn run(self) {
        let period = self.config.interval.max(Duration::from_millis(1));
        let origin = tokio::time::Instant::now();
        let mut tick = 0u32;
        let mut cycle = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = sleep_until(origin + period.saturating_mul(tick)) => {}
            }

            cycle += 1;
            self.metrics.increment_cycles_started();
            let start_time = Instant::now();

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    log::info!("Abandoning scrape cycle {} on shutdown", cycle);
                    self.metrics.increment_cycles_abandoned();
                    break;
                }
                result = run_cycle(&self.config, self.fetcher.as_ref(), cycle) => result,
            };

            let duration = start_time.elapsed();
            self.metrics
                .record_cycle(&result, duration, self.config.interval);
            if duration > self.config.interval {
                log::warn!(
                    "Scrape cycle {} took {}ms, longer than the {}s interval; skipping missed ticks",
                    cycle,
                    duration.as_millis(),
                    self.config.interval.as_secs()
                );
            }

            let cancel = self.cancel.clone();
            if !self.store.write_if(result, move || !cancel.is_cancelled()) {
                log::debug!("Discarding result of cycle {} after shutdown", cycle);
                break;
            }

            let next = next_tick(origin.elapsed(), period);
            if next > tick + 1 {
                log::debug!("Skipped {} tick(s) after cycle {}", next - tick - 1, cycle);
            }
            tick = next;
        }

        log::debug!("Scheduler loop finished.");
    }
}

/// Index of the first grid point strictly after `elapsed`.
fn next_tick(elapsed: Duration, period: Duration) -> u32 {
    let ticks = elapsed.as_nanos() / period.as_nanos() + 1;
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn empty_config() -> Config {
        parse_config(b"scrapeIntervalInSeconds: 1\nscrapeEndpoints: []\n").unwrap()
    }

    #[test]
    fn next_tick_lands_on_the_grid() {
        let second = Duration::from_secs(1);
        assert_eq!(next_tick(Duration::from_millis(300), second), 1);
        assert_eq!(next_tick(Duration::from_millis(1500), second), 2);
        assert_eq!(next_tick(Duration::from_millis(3999), second), 4);
        assert_eq!(next_tick(Duration::from_secs(4), second), 5);
    }

    #[test]
    fn start_outside_runtime_fails() {
        let engine = ScrapeEngine::new(empty_config()).unwrap();
        assert_eq!(engine.start(), Err(LifecycleError::NoRuntime));
        assert_eq!(engine.state(), EngineState::NotStarted);
    }

    #[test]
    fn stop_before_start_is_rejected() {
        let engine = ScrapeEngine::new(empty_config()).unwrap();
        assert_eq!(
            engine.stop(),
            Err(LifecycleError::NotRunning(EngineState::NotStarted))
        );
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn lifecycle_transitions() {
        let engine = ScrapeEngine::new(empty_config()).unwrap();
        assert!(!engine.is_running());

        engine.start().unwrap();
        assert!(engine.is_running());
        assert_eq!(
            engine.start(),
            Err(LifecycleError::AlreadyStarted(EngineState::Running))
        );
        assert!(engine.is_running());

        engine.stop().unwrap();
        assert!(!engine.is_running());
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(
            engine.start(),
            Err(LifecycleError::AlreadyStarted(EngineState::Stopped))
        );
        assert_eq!(
            engine.stop(),
            Err(LifecycleError::NotRunning(EngineState::Stopped))
        );
    }

    #[tokio::test]
    async fn zero_endpoints_still_publish_cycles() {
        let engine = ScrapeEngine::new(empty_config()).unwrap();
        let mut results = engine.watch_results();
        engine.start().unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(2), results.changed())
            .await
            .unwrap()
            .unwrap();
        let data = engine.get_scrape_data();
        assert_eq!(data.cycle, 1);
        assert!(data.endpoints.is_empty());
        assert!(data.error.is_none());
        engine.stop().unwrap();
    }
}

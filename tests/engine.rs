use async_trait::async_trait;
use scrapi::result::{NOT_RUNNING, NO_DATA_YET};
use scrapi::{
    parse_config, Config, EngineState, FetchError, FetchedPage, Fetcher, FieldResult,
    ScrapeEngine,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves a fixed page after a delay while tracking how many fetches overlap
/// and when each one started.
struct SlowFetcher {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    starts: Mutex<Vec<Instant>>,
}

impl SlowFetcher {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            starts: Mutex::new(Vec::new()),
        })
    }

    /// Gaps between consecutive fetch starts.
    fn start_gaps(&self) -> Vec<Duration> {
        let starts = self.starts.lock().unwrap();
        starts.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[async_trait]
impl Fetcher for SlowFetcher {
    async fn fetch(&self, _url: &Url, _timeout: Duration) -> Result<FetchedPage, FetchError> {
        self.starts.lock().unwrap().push(Instant::now());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(FetchedPage {
            status: 200,
            body: b"<div>Hello world</div>".to_vec(),
        })
    }
}

fn single_endpoint_config(url: &str) -> Config {
    parse_config(
        format!(
            r#"
scrapeIntervalInSeconds: 1
scrapeEndpoints:
  - endpoint: {url}
    selectors:
      - name: test
        typeOfSelector: xpath
        value: //div
"#
        )
        .as_bytes(),
    )
    .unwrap()
}

#[tokio::test]
async fn first_cycle_runs_promptly_after_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div>Hello world</div>"))
        .mount(&server)
        .await;

    let mut config = single_endpoint_config(&server.uri());
    config.interval = Duration::from_secs(60);
    let engine = ScrapeEngine::new(config).unwrap();

    let before = engine.get_scrape_data();
    assert!(before.is_placeholder());
    assert_eq!(before.error.as_deref(), Some(NO_DATA_YET));

    let mut results = engine.watch_results();
    engine.start().unwrap();
    timeout(Duration::from_secs(5), results.changed())
        .await
        .expect("first cycle should not wait for the interval")
        .unwrap();

    let data = engine.get_scrape_data();
    assert_eq!(data.cycle, 1);
    assert!(data.error.is_none());
    let field = data
        .endpoint(&format!("{}/", server.uri()))
        .and_then(|e| e.field("test"))
        .and_then(FieldResult::values)
        .unwrap();
    assert!(field.iter().any(|v| v.contains("Hello world")));

    engine.stop().unwrap();
}

#[tokio::test]
async fn keeps_ticking_while_endpoints_fail() {
    let engine = ScrapeEngine::new(single_endpoint_config("http://127.0.0.1:1")).unwrap();
    let mut results = engine.watch_results();
    engine.start().unwrap();

    for _ in 0..2 {
        timeout(Duration::from_secs(5), results.changed())
            .await
            .unwrap()
            .unwrap();
    }

    assert!(engine.is_running());
    let data = engine.get_scrape_data();
    assert!(data.cycle >= 2);
    assert!(data.error.is_none());
    assert!(data.endpoint("http://127.0.0.1:1/").unwrap().failure().is_some());
    engine.stop().unwrap();
}

#[tokio::test]
async fn cycles_never_overlap() {
    let fetcher = SlowFetcher::new(Duration::from_millis(1500));
    let engine = ScrapeEngine::with_fetcher(
        single_endpoint_config("http://scrape.test"),
        fetcher.clone(),
    );
    engine.start().unwrap();

    sleep(Duration::from_millis(4200)).await;
    engine.stop().unwrap();

    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
    let calls = fetcher.calls.load(Ordering::SeqCst);
    assert!((2..=3).contains(&calls), "unexpected call count {calls}");

    let metrics = engine.get_metrics();
    assert!(metrics.cycles_overrun >= 1);
}

fn assert_gap_between(gap: Duration, low_ms: u64, high_ms: u64) {
    assert!(
        gap >= Duration::from_millis(low_ms) && gap <= Duration::from_millis(high_ms),
        "gap of {}ms outside {low_ms}..={high_ms}ms",
        gap.as_millis()
    );
}

#[tokio::test]
async fn cycles_start_at_a_fixed_rate() {
    // Fixed-delay scheduling would space these 1.3s apart.
    let fetcher = SlowFetcher::new(Duration::from_millis(300));
    let engine = ScrapeEngine::with_fetcher(
        single_endpoint_config("http://scrape.test"),
        fetcher.clone(),
    );
    engine.start().unwrap();

    sleep(Duration::from_millis(2500)).await;
    engine.stop().unwrap();

    let gaps = fetcher.start_gaps();
    assert_eq!(gaps.len(), 2, "gaps: {gaps:?}");
    for gap in gaps {
        assert_gap_between(gap, 900, 1150);
    }
}

#[tokio::test]
async fn overrunning_cycle_waits_for_next_grid_point() {
    // 1.5s fetches on a 1s interval start at 0s, 2s and 4s; firing the late
    // tick right away would give 1.5s gaps instead.
    let fetcher = SlowFetcher::new(Duration::from_millis(1500));
    let engine = ScrapeEngine::with_fetcher(
        single_endpoint_config("http://scrape.test"),
        fetcher.clone(),
    );
    engine.start().unwrap();

    sleep(Duration::from_millis(4500)).await;
    engine.stop().unwrap();

    let gaps = fetcher.start_gaps();
    assert_eq!(gaps.len(), 2, "gaps: {gaps:?}");
    for gap in gaps {
        assert_gap_between(gap, 1900, 2200);
    }
    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stop_abandons_in_flight_cycle() {
    let fetcher = SlowFetcher::new(Duration::from_secs(2));
    let engine = ScrapeEngine::with_fetcher(
        single_endpoint_config("http://scrape.test"),
        fetcher.clone(),
    );
    engine.start().unwrap();
    sleep(Duration::from_millis(300)).await;
    assert_eq!(fetcher.in_flight.load(Ordering::SeqCst), 1);

    engine.stop().unwrap();
    assert!(!engine.is_running());
    assert_eq!(engine.state(), EngineState::Stopped);

    sleep(Duration::from_millis(2500)).await;
    let data = engine.get_scrape_data();
    assert!(data.is_placeholder(), "abandoned cycle must not be published");
    assert!(data.endpoints.is_empty());
    assert_eq!(data.error.as_deref(), Some(NOT_RUNNING));
    assert_eq!(fetcher.in_flight.load(Ordering::SeqCst), 1, "fetch future was dropped");
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.get_metrics().cycles_abandoned, 1);
}

#[tokio::test]
async fn stop_keeps_last_result_flagged_as_not_running() {
    let fetcher = SlowFetcher::new(Duration::from_millis(10));
    let engine = ScrapeEngine::with_fetcher(
        single_endpoint_config("http://scrape.test"),
        fetcher,
    );
    let mut results = engine.watch_results();
    engine.start().unwrap();
    timeout(Duration::from_secs(5), results.changed())
        .await
        .unwrap()
        .unwrap();

    engine.stop().unwrap();
    let data = engine.get_scrape_data();
    assert_eq!(data.cycle, 1);
    assert_eq!(data.endpoints.len(), 1);
    assert_eq!(data.error.as_deref(), Some(NOT_RUNNING));
}

#[tokio::test]
async fn readers_do_not_block_on_a_slow_cycle() {
    let fetcher = SlowFetcher::new(Duration::from_secs(3));
    let engine = Arc::new(ScrapeEngine::with_fetcher(
        single_endpoint_config("http://scrape.test"),
        fetcher,
    ));
    engine.start().unwrap();
    sleep(Duration::from_millis(100)).await;

    let reader = engine.clone();
    let data = timeout(
        Duration::from_millis(200),
        tokio::task::spawn_blocking(move || reader.get_scrape_data()),
    )
    .await
    .expect("read must not wait for the cycle")
    .unwrap();
    assert!(data.is_placeholder());
    engine.stop().unwrap();
}

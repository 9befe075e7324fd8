/// Snapshot poller for the trade monitor service
///
/// Fetches `GET /trades/monitor` immediately and then on a fixed interval,
/// applying every outcome to the shared [`MonitorState`]. Each fetch runs as
/// its own task tagged with a sequence number, so replies that arrive out of
/// order are discarded by the state rather than overwriting fresher data.

use crate::shared::error::{MonitorError, Result};
use crate::shared::state::MonitorState;
use crate::shared::types::MonitorResponse;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Poller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Trade monitor endpoint
    pub url: String,
    /// Delay between fetches
    pub poll_interval: Duration,
    /// Per-request timeout, none by default
    pub request_timeout: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/trades/monitor".to_string(),
            poll_interval: Duration::from_secs(60),
            request_timeout: None,
        }
    }
}

impl PollerConfig {
    /// Create a new configuration with custom URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set endpoint URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Where snapshots come from
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch and parse one snapshot
    async fn fetch(&self) -> Result<MonitorResponse>;
}

/// Plain `GET` against the trade monitor: no parameters, headers or auth
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(config: &PollerConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| MonitorError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    async fn fetch(&self) -> Result<MonitorResponse> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Periodic fetch-and-replace loop
pub struct Poller {
    config: PollerConfig,
    source: Arc<dyn SnapshotSource>,
    state: Arc<Mutex<MonitorState>>,
}

impl Poller {
    /// Create a poller fetching over HTTP
    pub fn new(config: PollerConfig, state: Arc<Mutex<MonitorState>>) -> Result<Self> {
        let source = Arc::new(HttpSource::new(&config)?);
        Ok(Self::with_source(config, source, state))
    }

    /// Create a poller with a custom snapshot source
    pub fn with_source(
        config: PollerConfig,
        source: Arc<dyn SnapshotSource>,
        state: Arc<Mutex<MonitorState>>,
    ) -> Self {
        Self {
            config,
            source,
            state,
        }
    }

    /// Start polling. The first fetch is issued immediately.
    pub fn start(self) -> PollerHandle {
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            run_poll_loop(self.config, self.source, self.state).await;
        });

        PollerHandle { state, task }
    }
}

/// Handle to a running [`Poller`]
pub struct PollerHandle {
    state: Arc<Mutex<MonitorState>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Shared state the poller writes into
    pub fn state(&self) -> Arc<Mutex<MonitorState>> {
        Arc::clone(&self.state)
    }

    /// Stop the timer and close the state.
    ///
    /// In-flight fetches are left to finish; their outcomes are ignored.
    pub async fn shutdown(self) {
        self.state.lock().await.close();
        self.task.abort();
        let _ = self.task.await;
        info!("Trade monitor poller stopped");
    }
}

/// Timer loop: one fetch task per tick, regardless of state
async fn run_poll_loop(
    config: PollerConfig,
    source: Arc<dyn SnapshotSource>,
    state: Arc<Mutex<MonitorState>>,
) {
    let period = config.poll_interval.max(Duration::from_millis(1));
    info!("Starting trade monitor poller for {} every {:?}", config.url, period);

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let sequence = {
            let mut guard = state.lock().await;
            if guard.is_closed() {
                debug!("State closed, stopping poll loop");
                break;
            }
            guard.begin_request()
        };

        tokio::spawn(poll_once(Arc::clone(&source), Arc::clone(&state), sequence));
    }
}

/// Fetch once and apply the outcome. Returns whether the state changed.
pub async fn poll_once(
    source: Arc<dyn SnapshotSource>,
    state: Arc<Mutex<MonitorState>>,
    sequence: u64,
) -> bool {
    debug!(sequence, "Fetching trade monitor snapshot");
    let outcome = source.fetch().await;

    let mut guard = state.lock().await;
    match outcome {
        Ok(response) => {
            let records = response.trades.len();
            let applied = guard.apply_snapshot(sequence, response);
            if applied {
                info!(sequence, records, "Applied trade monitor snapshot");
            }
            applied
        }
        Err(e) => {
            error!(sequence, "Failed to fetch trade monitor snapshot: {}", e);
            guard.apply_error(sequence, &e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::state::RefreshStatus;
    use crate::shared::types::{record, ZoneCount};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a script of (delay, outcome) pairs; the last entry repeats
    struct ScriptedSource {
        script: Vec<(Duration, Result<MonitorResponse>)>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<(Duration, Result<MonitorResponse>)>) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotSource for ScriptedSource {
        async fn fetch(&self) -> Result<MonitorResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, outcome) = &self.script[call.min(self.script.len() - 1)];
            if !delay.is_zero() {
                tokio::time::sleep(*delay).await;
            }
            outcome.clone()
        }
    }

    fn response(symbol: &str) -> MonitorResponse {
        MonitorResponse {
            trades: vec![record(symbol, "Z3", 1.0, 0.0)],
            timestamp: "2025-05-01T12:00:00Z".to_string(),
            zone_distribution: vec![ZoneCount { zone: "Z3".to_string(), count: 1 }],
        }
    }

    fn start(source: Arc<ScriptedSource>) -> PollerHandle {
        let state = Arc::new(Mutex::new(MonitorState::new()));
        let config = PollerConfig::default();
        Poller::with_source(config, source, state).start()
    }

    #[test]
    fn test_config_builder() {
        let config = PollerConfig::new("http://127.0.0.1:9000/trades/monitor")
            .with_poll_interval(Duration::from_secs(5))
            .with_request_timeout(Duration::from_secs(2));

        assert_eq!(config.url, "http://127.0.0.1:9000/trades/monitor");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_default_config() {
        let config = PollerConfig::default();
        assert_eq!(config.url, "http://localhost:8080/trades/monitor");
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_then_every_interval() {
        let source = ScriptedSource::new(vec![(Duration::ZERO, Ok(response("BTCUSDT")))]);
        let handle = start(Arc::clone(&source));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(handle.state().lock().await.status(), RefreshStatus::Ready);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_snapshot() {
        let source = ScriptedSource::new(vec![
            (Duration::ZERO, Ok(response("BTCUSDT"))),
            (Duration::ZERO, Err(MonitorError::Status(503))),
        ]);
        let handle = start(Arc::clone(&source));

        tokio::time::sleep(Duration::from_millis(1)).await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        let snap = handle.state().lock().await.snapshot();
        assert!(snap.is_error());
        assert_eq!(snap.snapshot.unwrap().records[0].symbol, "BTCUSDT");
        assert_eq!(snap.last_error.as_deref(), Some("trade monitor responded with HTTP 503"));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_reply_does_not_overwrite_newer_snapshot() {
        let source = ScriptedSource::new(vec![
            (Duration::from_secs(90), Ok(response("OLD"))),
            (Duration::ZERO, Ok(response("NEW"))),
        ]);
        let handle = start(Arc::clone(&source));

        // Second request lands at t=60, the first one only at t=90
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(source.calls(), 2);

        let snap = handle.state().lock().await.snapshot();
        assert_eq!(snap.snapshot.unwrap().records[0].symbol, "NEW");
        assert_eq!(snap.polls_applied, 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_polling() {
        let source = ScriptedSource::new(vec![(Duration::ZERO, Ok(response("BTCUSDT")))]);
        let handle = start(Arc::clone(&source));
        let state = handle.state();

        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.shutdown().await;

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.calls(), 1);
        assert!(state.lock().await.is_closed());
    }

    /// Serve one canned HTTP reply on a local port and return its URL
    async fn serve_once(reply: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/trades/monitor", addr)
    }

    fn http_reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\n\
             content-type: application/json\r\n\
             content-length: {}\r\n\
             connection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    async fn fetch_from(url: String) -> Result<MonitorResponse> {
        let source = HttpSource::new(&PollerConfig::new(url)).unwrap();
        source.fetch().await
    }

    #[tokio::test]
    async fn test_http_source_parses_snapshot() {
        let body = r#"{
            "trades": [],
            "timestamp": "t",
            "zone_distribution": [{"zone": "Z2", "count": 4}]
        }"#;
        let url = serve_once(http_reply("200 OK", body)).await;

        let response = fetch_from(url).await.unwrap();
        assert!(response.trades.is_empty());
        assert_eq!(response.zone_distribution[0].count, 4);
    }

    #[tokio::test]
    async fn test_http_source_error_taxonomy() {
        let url = serve_once(http_reply("503 Service Unavailable", "")).await;
        assert_eq!(fetch_from(url).await.unwrap_err(), MonitorError::Status(503));

        let url = serve_once(http_reply("200 OK", r#"{"trades": [{"symbol": "BTC"#)).await;
        assert!(matches!(fetch_from(url).await, Err(MonitorError::Parse(_))));

        let url = serve_once(http_reply("200 OK", r#"{"trades": []}"#)).await;
        assert!(matches!(fetch_from(url).await, Err(MonitorError::Parse(_))));

        // Bind then drop so nothing listens on the port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{}/trades/monitor", addr);
        assert!(matches!(fetch_from(url).await, Err(MonitorError::Transport(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_once_after_close_is_ignored() {
        let source = ScriptedSource::new(vec![(Duration::ZERO, Ok(response("BTCUSDT")))]);
        let state = Arc::new(Mutex::new(MonitorState::new()));
        let sequence = state.lock().await.begin_request();
        state.lock().await.close();

        assert!(!poll_once(source, Arc::clone(&state), sequence).await);
        assert!(state.lock().await.current().is_none());
    }
}

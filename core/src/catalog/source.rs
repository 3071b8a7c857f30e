use crate::prelude::{TrackError, TrackResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Public Starlink group in three-line element format.
pub const DEFAULT_CATALOG_URL: &str =
    "https://celestrak.org/NORAD/elements/gp.php?GROUP=starlink&FORMAT=tle";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the periodic tick gets its element text from.
#[async_trait]
pub trait ElementSource: Send + Sync {
    async fn fetch(&self) -> TrackResult<String>;

    fn describe(&self) -> String;
}

/// Catalog service over HTTP GET, optionally through a relay that takes the
/// target URL appended to its own.
pub struct HttpElementSource {
    client: reqwest::Client,
    url: String,
}

impl HttpElementSource {
    pub fn new(catalog_url: &str, relay_url: Option<&str>) -> TrackResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TrackError::Retrieval(e.to_string()))?;
        Ok(Self {
            client,
            url: relayed_url(catalog_url, relay_url),
        })
    }
}

pub fn relayed_url(catalog_url: &str, relay_url: Option<&str>) -> String {
    match relay_url.map(str::trim).filter(|relay| !relay.is_empty()) {
        Some(relay) => format!("{}{}", relay, catalog_url),
        None => catalog_url.to_string(),
    }
}

#[async_trait]
impl ElementSource for HttpElementSource {
    async fn fetch(&self) -> TrackResult<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TrackError::Retrieval(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackError::Retrieval(format!("{} from {}", status, self.url)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TrackError::Retrieval(e.to_string()))?;
        catalog_body(body.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Accepts a response body only if it is non-empty UTF-8 text.
pub fn catalog_body(bytes: Vec<u8>) -> TrackResult<String> {
    let text = String::from_utf8(bytes)
        .map_err(|_| TrackError::Retrieval("response body is not text".into()))?;
    if text.trim().is_empty() {
        return Err(TrackError::Retrieval("response body is empty".into()));
    }
    Ok(text)
}

/// Fixed catalog text, handed out on every fetch.
pub struct StaticElementSource {
    text: String,
}

impl StaticElementSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ElementSource for StaticElementSource {
    async fn fetch(&self) -> TrackResult<String> {
        catalog_body(self.text.clone().into_bytes())
    }

    fn describe(&self) -> String {
        format!("static catalog ({} bytes)", self.text.len())
    }
}

/// Catalog text file, re-read on every fetch.
pub struct FileElementSource {
    path: PathBuf,
}

impl FileElementSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ElementSource for FileElementSource {
    async fn fetch(&self) -> TrackResult<String> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| TrackError::Retrieval(format!("{}: {}", self.path.display(), e)))?;
        catalog_body(bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parser::parse_catalog;
    use crate::prelude::PipelineConfig;
    use crate::propagation::record::fixtures::*;
    use crate::schedule::clock::FixedClock;
    use crate::schedule::refresh::RefreshCycle;
    use crate::schedule::state::{SchedulerPhase, SharedView, ViewState};
    use crate::telemetry::MetricsRecorder;
    use std::sync::Arc;

    #[test]
    fn relay_prefixes_catalog_url() {
        assert_eq!(
            relayed_url("https://example.org/gp", Some("https://relay.example/?")),
            "https://relay.example/?https://example.org/gp"
        );
        assert_eq!(relayed_url("https://example.org/gp", Some("  ")), "https://example.org/gp");
        assert_eq!(relayed_url("https://example.org/gp", None), "https://example.org/gp");
    }

    #[test]
    fn empty_or_binary_body_is_a_retrieval_error() {
        assert!(matches!(catalog_body(Vec::new()), Err(TrackError::Retrieval(_))));
        assert!(matches!(
            catalog_body(b"\n \r\n".to_vec()),
            Err(TrackError::Retrieval(_))
        ));
        assert!(matches!(
            catalog_body(vec![0xff, 0xfe, 0x00]),
            Err(TrackError::Retrieval(_))
        ));
    }

    #[tokio::test]
    async fn static_source_returns_its_text() {
        let source = StaticElementSource::new("NAME\nA\nB\n");
        assert_eq!(source.fetch().await.unwrap(), "NAME\nA\nB\n");
    }

    /// Local catalog service: `/catalog` answers with element text,
    /// `/unavailable` with 503, `/empty` with an empty 200.
    fn serve_catalog() -> String {
        use warp::{http::StatusCode, Filter};

        let catalog = warp::path("catalog").map(|| catalog_text(&[VANGUARD]));
        let unavailable = warp::path("unavailable")
            .map(|| warp::reply::with_status("busy", StatusCode::SERVICE_UNAVAILABLE));
        let empty = warp::path("empty").map(|| warp::reply::with_status(String::new(), StatusCode::OK));

        let (addr, server) =
            warp::serve(catalog.or(unavailable).or(empty)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}", addr)
    }

    fn refresh_over(
        source: HttpElementSource,
        epoch: chrono::DateTime<chrono::Utc>,
        metrics: Arc<MetricsRecorder>,
    ) -> RefreshCycle {
        RefreshCycle::new(
            Arc::new(source),
            Arc::new(FixedClock::new(epoch)),
            metrics,
            crate::propagation::transform::SURFACE_RADIUS,
        )
    }

    #[tokio::test]
    async fn http_error_status_and_empty_body_are_retrieval_errors() {
        let base = serve_catalog();

        let unavailable = HttpElementSource::new(&format!("{}/unavailable", base), None).unwrap();
        assert!(matches!(unavailable.fetch().await, Err(TrackError::Retrieval(_))));

        let empty = HttpElementSource::new(&format!("{}/empty", base), None).unwrap();
        assert!(matches!(empty.fetch().await, Err(TrackError::Retrieval(_))));

        let catalog = HttpElementSource::new(&format!("{}/catalog", base), None).unwrap();
        assert!(catalog.fetch().await.unwrap().starts_with("VANGUARD 1"));
    }

    #[tokio::test]
    async fn failed_http_refresh_keeps_previous_snapshot() {
        let base = serve_catalog();
        let epoch = parse_catalog(&catalog_text(&[VANGUARD])).objects()[0]
            .record
            .epoch();
        let view = SharedView::new(ViewState::new(&PipelineConfig::default()));
        let metrics = Arc::new(MetricsRecorder::new());

        let good = HttpElementSource::new(&format!("{}/catalog", base), None).unwrap();
        refresh_over(good, epoch, metrics.clone()).run_once(&view).await;
        assert_eq!(view.output().generation, 1);
        assert_eq!(view.output().visible_count, 1);

        for path in ["unavailable", "empty"] {
            let source = HttpElementSource::new(&format!("{}/{}", base, path), None).unwrap();
            refresh_over(source, epoch, metrics.clone()).run_once(&view).await;

            let output = view.output();
            assert_eq!(output.phase, SchedulerPhase::Ready);
            assert_eq!(output.generation, 1);
            assert_eq!(output.visible_count, 1);
        }
        assert_eq!(metrics.snapshot().retrieval_errors, 2);
        assert_eq!(metrics.snapshot().refresh_cycles, 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_retrieval_error() {
        let source = FileElementSource::new("/nonexistent/catalog.tle");
        assert!(matches!(source.fetch().await, Err(TrackError::Retrieval(_))));
    }
}

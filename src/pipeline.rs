use std::path::Path;

use tracing::info;

use crate::config::Settings;
use crate::dom::Dom;
use crate::error::ScrapeError;
use crate::extract;
use crate::session::{Renderer, Session, SessionOptions};
use crate::snapshot::MarketSnapshot;
use crate::store;
use crate::user_agent;

/// One capture: open a session, render the page, extract, persist.
/// With `output` unset nothing is written.
pub async fn run(settings: &Settings, output: Option<&Path>) -> Result<MarketSnapshot, ScrapeError> {
    let ua = user_agent::random();
    info!("User agent: {}", ua);

    let session = Session::open(&SessionOptions {
        user_agent: ua,
        chrome: settings.chrome.as_deref(),
    })
    .await?;

    run_in(session, settings, output).await
}

/// Drive an open session through capture. The session is closed exactly
/// once, whatever the outcome.
async fn run_in<R: Renderer>(
    session: R,
    settings: &Settings,
    output: Option<&Path>,
) -> Result<MarketSnapshot, ScrapeError> {
    let outcome = capture(&session, settings, output).await;
    session.close().await;
    outcome
}

async fn capture<R: Renderer>(
    session: &R,
    settings: &Settings,
    output: Option<&Path>,
) -> Result<MarketSnapshot, ScrapeError> {
    session
        .navigate_and_await(&settings.url, &extract::READY, settings.readiness_timeout())
        .await?;
    match output {
        Some(path) => record(session.page(), path).await,
        None => extract::extract(session.page()).await,
    }
}

/// Extract from a ready page and append to `path`. Nothing is written unless
/// every required field was found.
pub async fn record<D: Dom>(dom: &D, path: &Path) -> Result<MarketSnapshot, ScrapeError> {
    let snapshot = extract::extract(dom).await?;
    store::append(&snapshot, path)?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::dom::fake::FakeDom;
    use crate::dom::wait_for;
    use crate::extract::fixtures::page_without_sentiment;
    use crate::dom::Locator;
    use crate::extract::{BEARISH, BULLISH, MARKET_CAP};
    use crate::snapshot::COLUMNS;

    #[tokio::test]
    async fn end_to_end_row_on_empty_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bitcoin_hourly_data.csv");

        let snap = record(&page_without_sentiment(), &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], COLUMNS.join(","));
        assert_eq!(
            lines[1],
            format!(
                r#"{},"$67,234.12",$1.3T,$28.5B,"19,700,000 BTC",+2.34%,N/A,N/A"#,
                snap.timestamp
            )
        );
    }

    #[tokio::test]
    async fn each_run_adds_exactly_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let dom = page_without_sentiment()
            .with(BULLISH, &["81%"])
            .with(BEARISH, &["19%"]);

        for expected in 1..=3 {
            record(&dom, &path).await.unwrap();
            assert_eq!(store::load(&path).unwrap().len(), expected);
        }
        let last = store::load(&path).unwrap().pop().unwrap();
        assert_eq!(last.bullish_sentiment, "81%");
        assert_eq!(last.bearish_sentiment, "19%");
    }

    #[tokio::test]
    async fn missing_required_field_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        record(&page_without_sentiment(), &path).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let mut broken = page_without_sentiment();
        broken.elements.remove(&MARKET_CAP);
        let err = record(&broken, &path).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Extraction { field: "market_cap" }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    /// Stands in for the browser: serves a fixed page and counts releases.
    struct FakeSession {
        dom: FakeDom,
        closes: Rc<Cell<usize>>,
    }

    impl FakeSession {
        fn new(dom: FakeDom) -> (Self, Rc<Cell<usize>>) {
            let closes = Rc::new(Cell::new(0));
            (
                Self {
                    dom,
                    closes: Rc::clone(&closes),
                },
                closes,
            )
        }
    }

    impl Renderer for FakeSession {
        type Page = FakeDom;

        async fn navigate_and_await(
            &self,
            _url: &str,
            ready: &Locator,
            _timeout: Duration,
        ) -> Result<(), ScrapeError> {
            wait_for(&self.dom, ready, Duration::from_millis(50), Duration::from_millis(5)).await
        }

        fn page(&self) -> &FakeDom {
            &self.dom
        }

        async fn close(self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    fn settings(output: &Path) -> Settings {
        Settings {
            url: crate::config::DEFAULT_URL.to_string(),
            output: output.to_path_buf(),
            timeout: 1,
            chrome: None,
        }
    }

    #[tokio::test]
    async fn success_writes_one_row_and_closes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let (session, closes) = FakeSession::new(page_without_sentiment());

        let snap = run_in(session, &settings(&path), Some(&path)).await.unwrap();

        assert_eq!(closes.get(), 1);
        assert_eq!(store::load(&path).unwrap(), vec![snap]);
    }

    #[tokio::test]
    async fn readiness_timeout_closes_and_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let (session, closes) = FakeSession::new(FakeDom::default());

        let err = run_in(session, &settings(&path), Some(&path)).await.unwrap_err();

        assert!(matches!(err, ScrapeError::ReadinessTimeout { .. }));
        assert_eq!(closes.get(), 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_field_closes_and_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut dom = page_without_sentiment();
        dom.elements.remove(&MARKET_CAP);
        let (session, closes) = FakeSession::new(dom);

        let err = run_in(session, &settings(&path), Some(&path)).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Extraction { field: "market_cap" }));
        assert_eq!(closes.get(), 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unwritable_output_closes_once() {
        let dir = tempfile::tempdir().unwrap();
        let (session, closes) = FakeSession::new(page_without_sentiment());

        let err = run_in(session, &settings(dir.path()), Some(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Persistence { .. }));
        assert_eq!(closes.get(), 1);
        assert!(dir.path().is_dir());
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let (session, closes) = FakeSession::new(page_without_sentiment());

        let snap = run_in(session, &settings(&path), None).await.unwrap();

        assert_eq!(snap.price, "$67,234.12");
        assert_eq!(closes.get(), 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_browser_is_session_start_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut cfg = settings(&path);
        cfg.chrome = Some(dir.path().join("no-such-chrome"));

        let err = run(&cfg, Some(&path)).await.unwrap_err();

        assert!(matches!(err, ScrapeError::SessionStart(_)));
        assert!(!path.exists());
    }
}

use std::fmt;
use std::time::Duration;

use chromiumoxide::Page;
use tracing::debug;

use crate::error::ScrapeError;

/// Delay between readiness probes.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How an element is found in the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(&'static str),
    XPath(&'static str),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{}", s),
            Locator::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// Read access to a rendered page.
pub trait Dom {
    /// Trimmed text of the first element matching `locator` in document
    /// order, or `None` when nothing matches.
    async fn first_text(&self, locator: &Locator) -> Result<Option<String>, ScrapeError>;
}

impl Dom for Page {
    async fn first_text(&self, locator: &Locator) -> Result<Option<String>, ScrapeError> {
        let elements = match locator {
            Locator::Css(sel) => self.find_elements(*sel).await?,
            Locator::XPath(path) => self.find_xpaths(*path).await?,
        };
        let Some(first) = elements.first() else {
            return Ok(None);
        };
        let text = first.inner_text().await?.unwrap_or_default();
        Ok(Some(text.trim().to_string()))
    }
}

/// Poll `dom` until `locator` matches or `timeout` elapses.
///
/// Probe errors (e.g. the document is being swapped mid-navigation) count
/// as "not yet". A lost browser connection fails the wait immediately.
pub async fn wait_for<D: Dom>(
    dom: &D,
    locator: &Locator,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ScrapeError> {
    let poll = async {
        loop {
            match dom.first_text(locator).await {
                Ok(Some(_)) => return Ok(()),
                Ok(None) => {}
                Err(e) if e.is_disconnect() => return Err(e),
                Err(e) => debug!("Readiness probe for {} failed: {}", locator, e),
            }
            tokio::time::sleep(interval).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::ReadinessTimeout {
            selector: locator.to_string(),
            timeout,
        }),
    }
}

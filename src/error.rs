use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Everything that can end a capture run early.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to launch browser: {0}")]
    SessionStart(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("page not ready: `{selector}` did not appear within {}s", .timeout.as_secs())]
    ReadinessTimeout { selector: String, timeout: Duration },

    #[error("required field `{field}` not found on page")]
    Extraction { field: &'static str },

    #[error("browser error: {0}")]
    Browser(#[from] CdpError),

    #[error("cannot persist to {}: {reason}", .path.display())]
    Persistence { path: PathBuf, reason: String },
}

impl ScrapeError {
    /// The CDP connection to the browser is gone; no later request can succeed.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            ScrapeError::Browser(
                CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse
            )
        )
    }

    pub(crate) fn persistence(path: &std::path::Path, reason: impl ToString) -> Self {
        ScrapeError::Persistence {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

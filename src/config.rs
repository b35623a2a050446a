use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

pub const DEFAULT_URL: &str = "https://coinmarketcap.com/currencies/bitcoin/";
pub const DEFAULT_OUTPUT: &str = "bitcoin_hourly_data.csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Browser window and viewport size.
pub const WINDOW: (u32, u32) = (1920, 1080);

/// Upper bound on a single CDP request, including the page load behind `goto`.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Run settings. Every value has a built-in default and can be overridden by
/// flag or environment variable.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Market page to capture
    #[arg(long, global = true, env = "BTC_SNAPSHOT_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// CSV log to append to
    #[arg(short, long, global = true, env = "BTC_SNAPSHOT_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Seconds to wait for the price element before giving up
    #[arg(short, long, global = true, env = "BTC_SNAPSHOT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Browser executable (auto-detected when unset)
    #[arg(long, global = true, env = "CHROME_PATH")]
    pub chrome: Option<PathBuf>,
}

impl Settings {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

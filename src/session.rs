use std::path::Path;
use std::time::Duration;

use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{NAVIGATION_TIMEOUT, WINDOW};
use crate::dom::{self, Dom, Locator, POLL_INTERVAL};
use crate::error::ScrapeError;

pub struct SessionOptions<'a> {
    pub user_agent: &'a str,
    pub chrome: Option<&'a Path>,
}

/// A running headless browser with one open tab.
///
/// [`Renderer::close`] consumes the session, so it can only be released once.
/// If a session is dropped without closing, the driver still kills the
/// browser process and the temporary profile is removed.
pub struct Session {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    _profile: TempDir,
}

impl Session {
    pub async fn open(opts: &SessionOptions<'_>) -> Result<Self, ScrapeError> {
        let profile = tempfile::Builder::new()
            .prefix("btc_snapshot-profile-")
            .tempdir()
            .map_err(|e| ScrapeError::SessionStart(format!("temporary profile: {}", e)))?;

        let (width, height) = WINDOW;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(width, height)
            .viewport(Viewport {
                width,
                height,
                ..Default::default()
            })
            .user_data_dir(profile.path())
            .request_timeout(NAVIGATION_TIMEOUT)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", opts.user_agent));
        if let Some(exe) = opts.chrome {
            builder = builder.chrome_executable(exe);
        }
        let config = builder.build().map_err(ScrapeError::SessionStart)?;

        info!("Launching headless browser");
        let (mut browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::SessionStart(e.to_string()))?;
        let handler = spawn_handler(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                shutdown(&mut browser, &handler).await;
                return Err(ScrapeError::SessionStart(format!("opening tab: {}", e)));
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
            _profile: profile,
        })
    }
}

/// A rendered browser tab that can be driven to a ready page and released.
pub trait Renderer {
    type Page: Dom;

    /// Load `url` and block until `ready` is present or `timeout` elapses.
    async fn navigate_and_await(
        &self,
        url: &str,
        ready: &Locator,
        timeout: Duration,
    ) -> Result<(), ScrapeError>;

    fn page(&self) -> &Self::Page;

    /// Release everything the session holds. Consumes the session.
    async fn close(self)
    where
        Self: Sized;
}

impl Renderer for Session {
    type Page = Page;

    async fn navigate_and_await(
        &self,
        url: &str,
        ready: &Locator,
        timeout: Duration,
    ) -> Result<(), ScrapeError> {
        info!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
            spinner.set_style(style);
        }
        spinner.set_message("waiting for page to render");
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = dom::wait_for(&self.page, ready, timeout, POLL_INTERVAL).await;
        spinner.finish_and_clear();
        result?;

        info!("Page ready ({})", ready);
        Ok(())
    }

    fn page(&self) -> &Page {
        &self.page
    }

    /// Shut the browser down and remove its profile directory.
    async fn close(mut self) {
        shutdown(&mut self.browser, &self.handler).await;
        info!("Browser session closed");
    }
}

async fn shutdown(browser: &mut Browser, handler: &JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        warn!("Browser close failed: {}", e);
    }
    if let Err(e) = browser.wait().await {
        warn!("Waiting for browser exit failed: {}", e);
    }
    handler.abort();
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("CDP handler event error: {}", e);
            }
        }
    })
}

use tracing::{debug, warn};

use crate::dom::{Dom, Locator};
use crate::error::ScrapeError;
use crate::snapshot::{self, MarketSnapshot, NOT_AVAILABLE};

/// Present once the price widget has rendered; used as the readiness probe.
pub const READY: Locator = Locator::Css(r#"span[data-test="text-cdp-price-display"]"#);

pub const PRICE: Locator = READY;
pub const MARKET_CAP: Locator = Locator::XPath(
    "//div[contains(text(),'Market cap')]/ancestor::dt/following-sibling::dd//span",
);
pub const VOLUME_24H: Locator = Locator::XPath(
    "//div[contains(text(),'Volume (24h')]/ancestor::dt/following-sibling::dd//span",
);
pub const CIRCULATING_SUPPLY: Locator = Locator::XPath(
    "//div[contains(text(),'Circulating supply')]/ancestor::dt/following-sibling::dd//span",
);
pub const PRICE_CHANGE_24H: Locator = Locator::Css("p[class*='change-text']");
pub const BULLISH: Locator = Locator::Css("span.sc-65e7f566-0.cOjBdO.ratio");
pub const BEARISH: Locator = Locator::Css("span.sc-65e7f566-0.iKkbth.ratio");

/// Read every metric off a ready page. A missing required field fails the
/// whole snapshot; missing sentiment falls back to `N/A`.
pub async fn extract<D: Dom>(dom: &D) -> Result<MarketSnapshot, ScrapeError> {
    let price = required(dom, "price", &PRICE).await?;
    let market_cap = required(dom, "market_cap", &MARKET_CAP).await?;
    let volume_24h = required(dom, "volume_24h", &VOLUME_24H).await?;
    let circulating_supply = required(dom, "circulating_supply", &CIRCULATING_SUPPLY).await?;
    let price_change_24h = required(dom, "price_change_24h", &PRICE_CHANGE_24H).await?;

    let bullish_sentiment = optional(dom, "bullish_sentiment", &BULLISH).await?;
    let bearish_sentiment = optional(dom, "bearish_sentiment", &BEARISH).await?;

    Ok(MarketSnapshot {
        timestamp: snapshot::now_stamp(),
        price,
        market_cap,
        volume_24h,
        circulating_supply,
        price_change_24h,
        bullish_sentiment,
        bearish_sentiment,
    })
}

async fn required<D: Dom>(
    dom: &D,
    field: &'static str,
    locator: &Locator,
) -> Result<String, ScrapeError> {
    match dom.first_text(locator).await? {
        Some(text) => {
            debug!("{} = {:?}", field, text);
            Ok(text)
        }
        None => {
            warn!("Required field {} not found ({})", field, locator);
            Err(ScrapeError::Extraction { field })
        }
    }
}

async fn optional<D: Dom>(
    dom: &D,
    field: &'static str,
    locator: &Locator,
) -> Result<String, ScrapeError> {
    match dom.first_text(locator).await? {
        Some(text) => Ok(text),
        None => {
            debug!("{} absent, recording {}", field, NOT_AVAILABLE);
            Ok(NOT_AVAILABLE.to_string())
        }
    }
}

use serde::{Deserialize, Serialize};

/// Placeholder for optional fields the page did not expose.
pub const NOT_AVAILABLE: &str = "N/A";

/// Timestamp layout, local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical column order of the output table. Must match the field order
/// of [`MarketSnapshot`], which drives the CSV header.
pub const COLUMNS: [&str; 8] = [
    "timestamp",
    "price",
    "market_cap",
    "volume_24h",
    "circulating_supply",
    "price_change_24h",
    "bullish_sentiment",
    "bearish_sentiment",
];

/// One captured set of market metrics. Values are display strings exactly
/// as rendered on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: String,
    pub price: String,
    pub market_cap: String,
    pub volume_24h: String,
    pub circulating_supply: String,
    pub price_change_24h: String,
    pub bullish_sentiment: String,
    pub bearish_sentiment: String,
}

impl MarketSnapshot {
    /// Field values in [`COLUMNS`] order.
    pub fn values(&self) -> [&str; 8] {
        [
            self.timestamp.as_str(),
            self.price.as_str(),
            self.market_cap.as_str(),
            self.volume_24h.as_str(),
            self.circulating_supply.as_str(),
            self.price_change_24h.as_str(),
            self.bullish_sentiment.as_str(),
            self.bearish_sentiment.as_str(),
        ]
    }
}

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn now_stamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

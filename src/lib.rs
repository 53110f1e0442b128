use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeSet;

pub mod config;
pub mod drexel;
pub mod error;
pub mod gateway;
pub mod html;
pub mod logging;
pub mod merge;
pub mod normalize;
pub mod report;
pub mod studio35;

#[cfg(feature = "browser")]
pub mod browser;

pub use error::{Result, ScrapeError};
pub use merge::ListingMerger;
pub use report::{Report, fetch_all};

/// Common listing structure that all scrapers produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub title: String,
    pub url: Option<String>,
    #[serde(rename = "runtime")]
    pub runtime_minutes: Option<u32>, // in minutes
    /// `YYYY-MM-DD HH:MM`, optionally followed by ` (label)`; sorted, no duplicates.
    pub showtimes: BTreeSet<String>,
}

impl Listing {
    pub fn new(title: impl Into<String>, url: Option<String>) -> Self {
        Self {
            title: title.into(),
            url,
            runtime_minutes: None,
            showtimes: BTreeSet::new(),
        }
    }

    /// Merge key: the URL when known, otherwise the title.
    pub fn key(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.title)
    }
}

/// Trait that all venue scrapers must implement
#[async_trait::async_trait]
pub trait CinemaScraper: Send + Sync {
    /// Fetch every listing currently published by the venue
    async fn fetch_listings(&self, client: &Client) -> Result<Vec<Listing>>;

    /// Key of this venue in the combined document (`gateway`, `studio35`, `drexel`)
    fn key(&self) -> &'static str;

    /// Human readable venue name, used in logs
    fn name(&self) -> &'static str;
}

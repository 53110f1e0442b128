//! Combined document: every venue's listings under its key.

use crate::{CinemaScraper, Listing, Result};
use futures::future::join_all;
use reqwest::Client;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;
use tracing::{error, info};

/// Venue key -> listings, kept in the order venues were added.
#[derive(Debug, Default)]
pub struct Report {
    venues: Vec<(String, Vec<Listing>)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, listings: Vec<Listing>) {
        let key = key.into();
        match self.venues.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = listings,
            None => self.venues.push((key, listings)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[Listing]> {
        self.venues
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, listings)| listings.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.venues.iter().map(|(k, _)| k.as_str())
    }

    /// Pretty-printed, two space indent, non-ASCII kept as is.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document, replacing any previous run's file.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.venues.len()))?;
        for (key, listings) in &self.venues {
            map.serialize_entry(key, listings)?;
        }
        map.end()
    }
}

/// Run every scraper concurrently. A venue whose scraper fails is logged and
/// recorded with no listings.
pub async fn fetch_all(scrapers: &[Box<dyn CinemaScraper>], client: &Client) -> Report {
    let results = join_all(scrapers.iter().map(|scraper| async move {
        let listings = match scraper.fetch_listings(client).await {
            Ok(listings) => listings,
            Err(e) => {
                error!(venue = scraper.key(), error = %e, "{} scraper failed", scraper.name());
                Vec::new()
            }
        };
        info!(venue = scraper.key(), count = listings.len(), "{}: saved {} shows", scraper.name(), listings.len());
        (scraper.key(), listings)
    }))
    .await;

    let mut report = Report::new();
    for (key, listings) in results {
        report.insert(key, listings);
    }
    report
}

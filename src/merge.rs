use crate::Listing;
use std::collections::HashMap;

/// Insertion-ordered accumulator that folds duplicate listings together.
///
/// Listings collide on [`Listing::key`]. On collision the first title wins,
/// showtimes are unioned and a missing runtime is filled in. A known runtime
/// is never replaced.
#[derive(Debug, Default)]
pub struct ListingMerger {
    index: HashMap<String, usize>,
    listings: Vec<Listing>,
}

impl ListingMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, listing: Listing) {
        match self.index.get(listing.key()).copied() {
            Some(i) => {
                let existing = &mut self.listings[i];
                existing.showtimes.extend(listing.showtimes);
                if existing.runtime_minutes.is_none() {
                    existing.runtime_minutes = listing.runtime_minutes;
                }
            }
            None => {
                self.index
                    .insert(listing.key().to_string(), self.listings.len());
                self.listings.push(listing);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn into_listings(self) -> Vec<Listing> {
        self.listings
    }
}

impl Extend<Listing> for ListingMerger {
    fn extend<I: IntoIterator<Item = Listing>>(&mut self, iter: I) {
        for listing in iter {
            self.insert(listing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, url: Option<&str>, runtime: Option<u32>, times: &[&str]) -> Listing {
        let mut l = Listing::new(title, url.map(String::from));
        l.runtime_minutes = runtime;
        l.showtimes = times.iter().map(|t| t.to_string()).collect();
        l
    }

    #[test]
    fn merges_by_url_and_unions_showtimes() {
        let mut merger = ListingMerger::new();
        merger.insert(listing(
            "Alien",
            Some("https://x/movies/alien/"),
            None,
            &["2025-09-25 19:00", "2025-09-24 21:00"],
        ));
        merger.insert(listing(
            "ALIEN (1979)",
            Some("https://x/movies/alien/"),
            Some(117),
            &["2025-09-24 21:00", "2025-09-26 13:15"],
        ));
        let out = merger.into_listings();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Alien");
        assert_eq!(out[0].runtime_minutes, Some(117));
        let times: Vec<&str> = out[0].showtimes.iter().map(String::as_str).collect();
        assert_eq!(
            times,
            vec!["2025-09-24 21:00", "2025-09-25 19:00", "2025-09-26 13:15"]
        );
    }

    #[test]
    fn known_runtime_is_kept() {
        let mut merger = ListingMerger::new();
        merger.insert(listing("Heat", Some("u"), Some(170), &[]));
        merger.insert(listing("Heat", Some("u"), None, &[]));
        merger.insert(listing("Heat", Some("u"), Some(1), &[]));
        assert_eq!(merger.into_listings()[0].runtime_minutes, Some(170));
    }

    #[test]
    fn falls_back_to_title_key_and_keeps_order() {
        let mut merger = ListingMerger::new();
        merger.extend([
            listing("Zodiac", None, None, &["2025-10-01 18:00"]),
            listing("Arrival", Some("u/arrival"), None, &[]),
            listing("Zodiac", None, Some(157), &["2025-10-02 18:00"]),
        ]);
        assert_eq!(merger.len(), 2);
        let out = merger.into_listings();
        assert_eq!(out[0].title, "Zodiac");
        assert_eq!(out[0].showtimes.len(), 2);
        assert_eq!(out[0].runtime_minutes, Some(157));
        assert_eq!(out[1].title, "Arrival");
    }
}

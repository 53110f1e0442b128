//! Scraper for Studio 35 Cinema & Drafthouse.
//! Home: https://studio35.com/home (links to /movie/... pages)
//! Movie pages list showings as `h2 a[href*='/checkout/showing/']` with text
//! like "September 24, 8:45 pm" and embed a schema.org `Movie` in JSON-LD
//! whose `duration` is the runtime.
//!
//! The site renders its listings with JavaScript. With the `browser` feature
//! pages can be loaded through a WebDriver endpoint instead of plain HTTP.

use crate::html::{HttpLoader, PageLoader, element_text, resolve, selector};
use crate::normalize::{iso_duration_minutes, parse_month_day_time};
use crate::{CinemaScraper, Listing, Result};
use reqwest::Client;
use scraper::Html;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use url::Url;

const HOME_URL: &str = "https://studio35.com/home";

/// How Studio 35 pages are loaded.
#[derive(Debug, Clone, Default)]
pub enum PageSource {
    #[default]
    Http,
    /// WebDriver endpoint, e.g. `http://localhost:9515` for chromedriver.
    #[cfg(feature = "browser")]
    WebDriver(String),
}

struct MoviePage {
    title: String,
    showtimes: BTreeSet<String>,
    runtime: Option<u32>,
}

pub struct Studio35Scraper {
    home_url: String,
    year: i32,
    source: PageSource,
}

impl Studio35Scraper {
    /// `year` completes showing dates, which the site prints without one.
    pub fn new(year: i32) -> Self {
        Self::with_url(HOME_URL.to_string(), year)
    }

    pub fn with_url(home_url: String, year: i32) -> Self {
        Self {
            home_url,
            year,
            source: PageSource::Http,
        }
    }

    pub fn source(mut self, source: PageSource) -> Self {
        self.source = source;
        self
    }

    async fn scrape(&self, pages: &dyn PageLoader) -> Result<Vec<Listing>> {
        let base = Url::parse(&self.home_url)?;
        let home = pages.load(&self.home_url).await?;
        let links = parse_movie_links(&home, &base)?;
        debug!(count = links.len(), "studio35 movie links");
        if links.is_empty() {
            warn!(url = %self.home_url, "{}", empty_home_hint(&self.source));
        }

        let mut listings = Vec::with_capacity(links.len());
        for url in links {
            let body = match pages.load(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %url, error = %e, "could not load movie page");
                    continue;
                }
            };
            let page = match parse_movie_page(&body, self.year) {
                Ok(page) => page,
                Err(e) => {
                    warn!(url = %url, error = %e, "could not parse movie page");
                    continue;
                }
            };
            let mut listing = Listing::new(page.title, Some(url));
            listing.runtime_minutes = page.runtime;
            listing.showtimes = page.showtimes;
            listings.push(listing);
        }
        Ok(listings)
    }
}

#[async_trait::async_trait]
impl CinemaScraper for Studio35Scraper {
    async fn fetch_listings(&self, client: &Client) -> Result<Vec<Listing>> {
        match &self.source {
            PageSource::Http => self.scrape(&HttpLoader::new(client)).await,
            #[cfg(feature = "browser")]
            PageSource::WebDriver(endpoint) => {
                let browser = crate::browser::BrowserSession::connect(endpoint).await?;
                let result = self.scrape(&browser).await;
                if let Err(e) = browser.close().await {
                    warn!(error = %e, "could not close browser session");
                }
                result
            }
        }
    }

    fn key(&self) -> &'static str {
        "studio35"
    }

    fn name(&self) -> &'static str {
        "Studio 35"
    }
}

/// Explains an empty home page, which over plain HTTP usually means the
/// listings were never rendered rather than that nothing is playing.
fn empty_home_hint(source: &PageSource) -> &'static str {
    match source {
        PageSource::Http => {
            "no movie links on studio35 home page; the site renders listings with script \
             and plain HTTP may not see them (build with feature `browser` and pass --webdriver)"
        }
        #[cfg(feature = "browser")]
        PageSource::WebDriver(_) => "no movie links on rendered studio35 home page",
    }
}

/// Unique movie page URLs, sorted.
fn parse_movie_links(html: &str, base: &Url) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let link_sel = selector("a[href*='/movie/']")?;
    let links: BTreeSet<String> = doc
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve(base, href))
        .collect();
    Ok(links.into_iter().collect())
}

fn parse_movie_page(html: &str, year: i32) -> Result<MoviePage> {
    let doc = Html::parse_document(html);
    let name_sel = selector("h1[itemprop='name']")?;
    let h1_sel = selector("h1")?;
    let showing_sel = selector("h2 a[href*='/checkout/showing/']")?;

    let title = doc
        .select(&name_sel)
        .next()
        .or_else(|| doc.select(&h1_sel).next())
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let showtimes = doc
        .select(&showing_sel)
        .filter_map(|a| parse_month_day_time(&element_text(a), year))
        .collect();

    Ok(MoviePage {
        title,
        showtimes,
        runtime: json_ld_runtime(&doc)?,
    })
}

/// Runtime of the first JSON-LD `Movie` carrying a usable `duration`.
/// Blocks that are not valid JSON are skipped.
fn json_ld_runtime(doc: &Html) -> Result<Option<u32>> {
    let script_sel = selector("script[type='application/ld+json']")?;
    for script in doc.select(&script_sel) {
        let raw: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        if let Some(minutes) = movie_duration(&value) {
            return Ok(Some(minutes));
        }
    }
    Ok(None)
}

fn movie_duration(value: &Value) -> Option<u32> {
    match value {
        Value::Array(items) => items.iter().find_map(movie_duration),
        Value::Object(obj) => {
            if let Some(minutes) = obj.get("@graph").and_then(movie_duration) {
                return Some(minutes);
            }
            if obj.get("@type").and_then(Value::as_str) != Some("Movie") {
                return None;
            }
            obj.get("duration")
                .and_then(Value::as_str)
                .and_then(iso_duration_minutes)
        }
        _ => None,
    }
}

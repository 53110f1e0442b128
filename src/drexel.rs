//! Scraper for the Drexel Theatre, sold through Agile Ticketing.
//! List page: https://prod1.agileticketing.net/websales/pages/list.aspx?epguid=...
//! Each `div.ItemInfo` is one film: `h3.Name` (with a `div.Descriptive`
//! genre/runtime line inside), a `ViewLink` to its detail page, and
//! `div.ShowingTimes` groups of one date plus several times.

use crate::html::{element_text, fetch_html, find_next, has_class, resolve, selector};
use crate::normalize::{hours_minutes_runtime, parse_weekday_date_time};
use crate::{CinemaScraper, Listing, Result};
use reqwest::Client;
use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

const LIST_URL: &str = "https://prod1.agileticketing.net/websales/pages/list.aspx?epguid=ab0b2f82-403c-4972-9998-5475e7dcfa0e&";

pub struct DrexelScraper {
    list_url: String,
    year: i32,
}

impl DrexelScraper {
    /// `year` completes showing dates, which the vendor prints without one.
    pub fn new(year: i32) -> Self {
        Self::with_url(LIST_URL.to_string(), year)
    }

    pub fn with_url(list_url: String, year: i32) -> Self {
        Self { list_url, year }
    }
}

#[async_trait::async_trait]
impl CinemaScraper for DrexelScraper {
    async fn fetch_listings(&self, client: &Client) -> Result<Vec<Listing>> {
        let base = Url::parse(&self.list_url)?;
        let body = fetch_html(client, &self.list_url).await?;
        let listings = parse_list_page(&body, &base, self.year)?;
        debug!(count = listings.len(), "drexel items parsed");
        Ok(listings)
    }

    fn key(&self) -> &'static str {
        "drexel"
    }

    fn name(&self) -> &'static str {
        "Drexel Theatre"
    }
}

fn parse_list_page(html: &str, base: &Url, year: i32) -> Result<Vec<Listing>> {
    let doc = Html::parse_document(html);
    let item_sel = selector("div.ItemInfo")?;
    let name_sel = selector("h3.Name")?;
    let descriptive_sel = selector("div.Descriptive")?;
    let group_sel = selector("div.ShowingTimes")?;
    let date_sel = selector("span.Date")?;
    let time_sel = selector("span.Showing a")?;
    let root = doc.root_element();

    let mut listings = Vec::new();
    for item in doc.select(&item_sel) {
        let Some(name) = item.select(&name_sel).next() else {
            continue;
        };
        let descriptive = name.select(&descriptive_sel).next();
        let title = heading_title(name, descriptive);
        if title.is_empty() {
            continue;
        }

        let url = find_next(root, item, |el| {
            el.value().name() == "a" && has_class(el, "ViewLink")
        })
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve(base, href));

        let mut listing = Listing::new(title, url);
        listing.runtime_minutes = descriptive.and_then(|d| hours_minutes_runtime(&element_text(d)));

        for group in item.select(&group_sel) {
            let Some(date) = group.select(&date_sel).next() else {
                continue;
            };
            let date_text = element_text(date);
            listing.showtimes.extend(
                group
                    .select(&time_sel)
                    .filter_map(|a| parse_weekday_date_time(&date_text, &element_text(a), year)),
            );
        }
        listings.push(listing);
    }
    Ok(listings)
}

/// Heading text without the nested descriptive line, so the genre/runtime
/// text the vendor nests inside `h3.Name` never leaks into the title.
fn heading_title(name: ElementRef<'_>, descriptive: Option<ElementRef<'_>>) -> String {
    let Some(descriptive) = descriptive else {
        return element_text(name);
    };
    name.descendants()
        .filter(|node| !node.ancestors().any(|a| a.id() == descriptive.id()))
        .filter_map(|node| node.value().as_text().map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

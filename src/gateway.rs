//! Scraper for the Gateway Film Center.
//! Upcoming films: https://gatewayfilmcenter.org/our-program/upcoming-films/
//! Now playing: homepage `#now-playing` section, one movie page per film.
//! Showtimes are `ol.showtimes li[data-date]` items whose unix epoch is
//! declared in a sibling `ul.datelist`.

use crate::html::{element_text, fetch_html, find_next, has_class, resolve, selector};
use crate::normalize::{format_showtime, gateway_runtime, parse_time_12h};
use crate::{CinemaScraper, Listing, ListingMerger, Result};
use chrono::{Local, NaiveDate, TimeZone};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

const HOME_URL: &str = "https://gatewayfilmcenter.org/";
const UPCOMING_URL: &str = "https://gatewayfilmcenter.org/our-program/upcoming-films/";

static RE_4K: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b4K\b").expect("invalid regex: 4K"));

/// One `div.showtimes-description` block of the upcoming page.
struct UpcomingBlock {
    title: String,
    url: Option<String>,
    showtimes: BTreeSet<String>,
}

/// Everything a movie page yields.
#[derive(Debug, Clone)]
struct MoviePage {
    title: String,
    showtimes: BTreeSet<String>,
    runtime: Option<u32>,
}

/// Movie pages by URL. Each page is requested at most once per run, whichever
/// entry point reaches it first; failures are remembered as `None`.
#[derive(Default)]
struct MovieCache {
    pages: HashMap<String, Option<MoviePage>>,
}

impl MovieCache {
    async fn get(&mut self, client: &Client, url: &str) -> Option<MoviePage> {
        if let Some(page) = self.pages.get(url) {
            return page.clone();
        }
        debug!(url, "fetching movie page");
        let page = match fetch_html(client, url).await {
            Ok(body) => match parse_movie_page(&body) {
                Ok(page) => Some(page),
                Err(e) => {
                    warn!(url, error = %e, "could not parse movie page");
                    None
                }
            },
            Err(e) => {
                warn!(url, error = %e, "could not fetch movie page");
                None
            }
        };
        self.pages.insert(url.to_string(), page.clone());
        page
    }
}

pub struct GatewayScraper {
    home_url: String,
    upcoming_url: String,
}

impl GatewayScraper {
    pub fn new() -> Self {
        Self::with_urls(HOME_URL.to_string(), UPCOMING_URL.to_string())
    }

    pub fn with_urls(home_url: String, upcoming_url: String) -> Self {
        Self {
            home_url,
            upcoming_url,
        }
    }

    async fn collect_upcoming(&self, client: &Client, cache: &mut MovieCache) -> Result<Vec<Listing>> {
        let base = Url::parse(&self.upcoming_url)?;
        let body = fetch_html(client, &self.upcoming_url).await?;
        let blocks = parse_upcoming(&body, &base)?;

        let mut listings = Vec::with_capacity(blocks.len());
        for block in blocks {
            let runtime = match &block.url {
                Some(url) => cache.get(client, url).await.and_then(|page| page.runtime),
                None => None,
            };
            let mut listing = Listing::new(block.title, block.url);
            listing.runtime_minutes = runtime;
            listing.showtimes = block.showtimes;
            listings.push(listing);
        }
        Ok(listings)
    }

    async fn collect_now_playing(&self, client: &Client, cache: &mut MovieCache) -> Result<Vec<Listing>> {
        let base = Url::parse(&self.home_url)?;
        let body = fetch_html(client, &self.home_url).await?;
        let links = parse_now_playing_links(&body, &base)?;

        let mut listings = Vec::with_capacity(links.len());
        for url in links {
            let Some(page) = cache.get(client, &url).await else {
                continue;
            };
            let mut listing = Listing::new(page.title, Some(url));
            listing.runtime_minutes = page.runtime;
            listing.showtimes = page.showtimes;
            listings.push(listing);
        }
        Ok(listings)
    }
}

impl Default for GatewayScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CinemaScraper for GatewayScraper {
    async fn fetch_listings(&self, client: &Client) -> Result<Vec<Listing>> {
        let mut cache = MovieCache::default();
        let mut merger = ListingMerger::new();

        // Either entry point may fail on its own; keep whatever the other one found.
        match self.collect_upcoming(client, &mut cache).await {
            Ok(listings) => {
                info!(count = listings.len(), "gateway upcoming page parsed");
                merger.extend(listings);
            }
            Err(e) => warn!(url = %self.upcoming_url, error = %e, "skipping gateway upcoming page"),
        }
        match self.collect_now_playing(client, &mut cache).await {
            Ok(listings) => {
                info!(count = listings.len(), "gateway now playing parsed");
                merger.extend(listings);
            }
            Err(e) => warn!(url = %self.home_url, error = %e, "skipping gateway homepage"),
        }

        Ok(merger.into_listings())
    }

    fn key(&self) -> &'static str {
        "gateway"
    }

    fn name(&self) -> &'static str {
        "Gateway Film Center"
    }
}

fn parse_upcoming(html: &str, base: &Url) -> Result<Vec<UpcomingBlock>> {
    let doc = Html::parse_document(html);
    let block_sel = selector("div.showtimes-description")?;
    let link_sel = selector("h2.show-title a.title, h2.show-title a")?;
    let heading_sel = selector("h2.show-title")?;

    let mut blocks = Vec::new();
    for block in doc.select(&block_sel) {
        let (title, url) = match block.select(&link_sel).next() {
            Some(a) => (
                element_text(a),
                a.value().attr("href").and_then(|href| resolve(base, href)),
            ),
            None => match block.select(&heading_sel).next() {
                Some(h2) => (element_text(h2), None),
                None => continue,
            },
        };
        if title.is_empty() {
            continue;
        }
        blocks.push(UpcomingBlock {
            title,
            url,
            showtimes: showtimes_from_block(block)?,
        });
    }
    Ok(blocks)
}

/// Movie links of the "now playing" section, absolute, unique and sorted.
fn parse_now_playing_links(html: &str, base: &Url) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let now_playing_sel = selector("#now-playing a[href*='/movies/']")?;
    let fallback_sel = selector(".show a[href*='/movies/']")?;

    let collect = |sel: &Selector| -> BTreeSet<String> {
        doc.select(sel)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve(base, href))
            .collect()
    };
    let mut links = collect(&now_playing_sel);
    if links.is_empty() {
        links = collect(&fallback_sel);
    }
    Ok(links.into_iter().collect())
}

fn parse_movie_page(html: &str) -> Result<MoviePage> {
    let doc = Html::parse_document(html);
    let title_sel = selector("h2.show-title a.title, h2.show-title a")?;
    let fallback_title_sel = selector("h1, h2.show-title")?;
    let specs_sel = selector("div.show-description p.show-specs")?;

    let title = doc
        .select(&title_sel)
        .next()
        .or_else(|| doc.select(&fallback_title_sel).next())
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let runtime = doc
        .select(&specs_sel)
        .next()
        .and_then(|p| gateway_runtime(&element_text(p)));

    Ok(MoviePage {
        title,
        showtimes: showtimes_from_block(doc.root_element())?,
        runtime,
    })
}

/// Showtimes inside `scope`: dates come from the epoch list, times from the
/// `a.showtime` anchor of each item that references a known epoch.
fn showtimes_from_block(scope: ElementRef<'_>) -> Result<BTreeSet<String>> {
    let date_sel = selector("ul.datelist li.show-date[data-date]")?;
    let item_sel = selector("ol.showtimes li[data-date]")?;
    let time_sel = selector("a.showtime")?;

    let dates: HashMap<&str, NaiveDate> = scope
        .select(&date_sel)
        .filter_map(|li| {
            let epoch = li.value().attr("data-date")?.trim();
            Some((epoch, epoch_to_local_date(epoch)?))
        })
        .collect();

    let mut showtimes = BTreeSet::new();
    for li in scope.select(&item_sel) {
        let epoch = li.value().attr("data-date").unwrap_or("").trim();
        let Some(&date) = dates.get(epoch) else {
            continue;
        };
        let Some(anchor) = li.select(&time_sel).next() else {
            continue;
        };
        let Some(hm) = parse_time_12h(&element_text(anchor)) else {
            continue;
        };
        let label = showtime_label(scope, li);
        showtimes.insert(format_showtime(date, &hm, label.as_deref()));
    }
    Ok(showtimes)
}

/// `4K` when the next pill (or the item itself) mentions it, else the first
/// 20 characters of the next pill.
fn showtime_label(scope: ElementRef<'_>, item: ElementRef<'_>) -> Option<String> {
    let pill = find_next(scope, item, |el| el.value().name() == "a" && has_class(el, "pill"));
    if let Some(pill) = pill {
        let text = element_text(pill);
        if RE_4K.is_match(&text) {
            return Some("4K".to_string());
        }
        let short: String = text.chars().take(20).collect();
        let short = short.trim();
        if !short.is_empty() {
            return Some(short.to_string());
        }
    }
    RE_4K
        .is_match(&element_text(item))
        .then(|| "4K".to_string())
}

fn epoch_to_local_date(epoch: &str) -> Option<NaiveDate> {
    let secs: i64 = epoch.parse().ok()?;
    Local
        .timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch(y: i32, m: u32, d: u32) -> i64 {
        Local
            .with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .unwrap()
            .timestamp()
    }

    fn upcoming_block(title_html: &str, body: &str) -> String {
        format!(r#"<div class="showtimes-description"><h2 class="show-title">{title_html}</h2>{body}</div>"#)
    }

    #[test]
    fn showtimes_join_epoch_dates_with_times() {
        let (a, b) = (epoch(2025, 9, 24), epoch(2025, 9, 25));
        let html = format!(
            r#"<div id="s">
                 <ul class="datelist">
                   <li class="show-date" data-date="{a}">Wed</li>
                   <li class="show-date" data-date="{b}">Thu</li>
                 </ul>
                 <ol class="showtimes">
                   <li data-date="{b}"><a class="showtime">1:15 pm</a></li>
                   <li data-date="{a}"><a class="showtime">7:30 pm</a></li>
                   <li data-date="{a}"><a class="showtime">7:30 pm</a></li>
                   <li data-date="{a}"><a class="showtime">Sold out</a></li>
                   <li data-date="12345"><a class="showtime">9 pm</a></li>
                   <li data-date="{b}"><span>10 pm</span></li>
                 </ol>
               </div>"#
        );
        let doc = Html::parse_document(&html);
        let times = showtimes_from_block(doc.root_element()).unwrap();
        let times: Vec<&str> = times.iter().map(String::as_str).collect();
        assert_eq!(times, vec!["2025-09-24 19:30", "2025-09-25 13:15"]);
    }

    #[test]
    fn pill_label_shortens_4k_restoration() {
        let a = epoch(2025, 10, 1);
        let html = format!(
            r#"<ul class="datelist"><li class="show-date" data-date="{a}"></li></ul>
               <ol class="showtimes"><li data-date="{a}"><a class="showtime">8:00 pm</a></li></ol>
               <a class="pill" href="/series/4k">4K Restoration</a>"#
        );
        let doc = Html::parse_document(&html);
        let times = showtimes_from_block(doc.root_element()).unwrap();
        assert_eq!(times.into_iter().collect::<Vec<_>>(), vec!["2025-10-01 20:00 (4K)"]);
    }

    #[test]
    fn pill_label_truncates_other_series_names() {
        let a = epoch(2025, 10, 1);
        let html = format!(
            r#"<ul class="datelist"><li class="show-date" data-date="{a}"></li></ul>
               <ol class="showtimes"><li data-date="{a}"><a class="showtime">8:00 pm</a></li></ol>
               <a class="pill">Midnight Madness Series Presents</a>"#
        );
        let doc = Html::parse_document(&html);
        let times = showtimes_from_block(doc.root_element()).unwrap();
        assert_eq!(
            times.into_iter().collect::<Vec<_>>(),
            vec!["2025-10-01 20:00 (Midnight Madness Ser)"]
        );
    }

    #[test]
    fn item_text_4k_without_pill() {
        let a = epoch(2025, 10, 2);
        let html = format!(
            r#"<ul class="datelist"><li class="show-date" data-date="{a}"></li></ul>
               <ol class="showtimes"><li data-date="{a}"><a class="showtime">6 pm</a> <span>in 4K</span></li></ol>"#
        );
        let doc = Html::parse_document(&html);
        let times = showtimes_from_block(doc.root_element()).unwrap();
        assert_eq!(times.into_iter().collect::<Vec<_>>(), vec!["2025-10-02 18:00 (4K)"]);
    }

    #[test]
    fn upcoming_blocks_resolve_links_and_fall_back_to_heading() {
        let a = epoch(2025, 9, 30);
        let times = format!(
            r#"<ul class="datelist"><li class="show-date" data-date="{a}"></li></ul>
               <ol class="showtimes"><li data-date="{a}"><a class="showtime">4:00 pm</a></li></ol>"#
        );
        let html = [
            upcoming_block(r#"<a class="title" href="/movies/alien/">Alien</a>"#, &times),
            upcoming_block("Secret Screening", ""),
            r#"<div class="showtimes-description"><p>no heading</p></div>"#.to_string(),
        ]
        .join("\n");
        let base = Url::parse(UPCOMING_URL).unwrap();
        let blocks = parse_upcoming(&html, &base).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].title, "Alien");
        assert_eq!(
            blocks[0].url.as_deref(),
            Some("https://gatewayfilmcenter.org/movies/alien/")
        );
        assert_eq!(blocks[0].showtimes.len(), 1);
        assert_eq!(blocks[1].title, "Secret Screening");
        assert_eq!(blocks[1].url, None);
        assert!(blocks[1].showtimes.is_empty());
    }

    #[test]
    fn pill_labels_only_its_own_block() {
        let (a, b) = (epoch(2025, 10, 4), epoch(2025, 10, 5));
        let times = |e: i64, t: &str| {
            format!(
                r#"<ul class="datelist"><li class="show-date" data-date="{e}"></li></ul>
                   <ol class="showtimes"><li data-date="{e}"><a class="showtime">{t}</a></li></ol>"#
            )
        };
        let first = format!(r#"{}<a class="pill" href="/series/cult">Cult Classics</a>"#, times(a, "9 pm"));
        let third = format!(r#"{}<a class="pill">4K Restoration</a>"#, times(b, "8 pm"));
        let html = [
            upcoming_block("The Warriors", &first),
            upcoming_block("Paterson", &times(b, "5 pm")),
            upcoming_block("Ran", &third),
        ]
        .join("\n");
        let base = Url::parse(UPCOMING_URL).unwrap();
        let blocks = parse_upcoming(&html, &base).unwrap();

        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[0].showtimes.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["2025-10-04 21:00 (Cult Classics)"]
        );
        assert_eq!(
            blocks[1].showtimes.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["2025-10-05 17:00"]
        );
        assert_eq!(
            blocks[2].showtimes.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["2025-10-05 20:00 (4K)"]
        );
    }

    #[test]
    fn now_playing_links_prefer_section_then_fallback() {
        let base = Url::parse(HOME_URL).unwrap();
        let html = r#"
            <section id="now-playing">
              <a href="/movies/b/">B</a><a href="/movies/a/">A</a><a href="/movies/b/">B again</a>
              <a href="/events/x/">not a movie</a>
            </section>
            <div class="show"><a href="/movies/c/">C</a></div>"#;
        assert_eq!(
            parse_now_playing_links(html, &base).unwrap(),
            vec![
                "https://gatewayfilmcenter.org/movies/a/".to_string(),
                "https://gatewayfilmcenter.org/movies/b/".to_string(),
            ]
        );

        let html = r#"<div class="show"><a href="/movies/c/">C</a></div>"#;
        assert_eq!(
            parse_now_playing_links(html, &base).unwrap(),
            vec!["https://gatewayfilmcenter.org/movies/c/".to_string()]
        );
    }

    #[test]
    fn movie_page_title_and_runtime() {
        let html = r#"
            <h1>Gateway Film Center</h1>
            <h2 class="show-title"><a class="title" href="/buy">Paris, Texas</a></h2>
            <div class="show-description"><p class="show-specs">Rated R | Run Time: 145 min. | 1984</p></div>"#;
        let page = parse_movie_page(html).unwrap();
        assert_eq!(page.title, "Paris, Texas");
        assert_eq!(page.runtime, Some(145));
        assert!(page.showtimes.is_empty());

        let page = parse_movie_page("<p>nothing</p>").unwrap();
        assert_eq!(page.title, "Unknown");
        assert_eq!(page.runtime, None);
    }
}

//! Fetching and DOM helpers shared by the venue scrapers.

use crate::{Result, ScrapeError};
use reqwest::{Client, header};
use scraper::{ElementRef, Selector};
use std::time::Duration;
use url::Url;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

/// Build the shared client. The cookie store keeps any session cookie a site
/// hands out on its first page.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .cookie_store(true)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// GET a page with a browser-like user agent and return its body.
pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .header(header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?;
    Ok(resp.text().await?)
}

/// Where page source comes from. Plain HTTP unless a venue needs a browser
/// to run its scripts first.
#[async_trait::async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<String>;
}

pub struct HttpLoader<'a> {
    client: &'a Client,
}

impl<'a> HttpLoader<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl<'a> PageLoader for HttpLoader<'a> {
    async fn load(&self, url: &str) -> Result<String> {
        fetch_html(self.client, url).await
    }
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("{css}: {e}")))
}

/// Non-empty text nodes of an element, trimmed and joined by one space.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// First element after `start` in document order (its own descendants
/// included) that lies inside `scope` and satisfies `pred`.
pub fn find_next<'a, F>(scope: ElementRef<'a>, start: ElementRef<'a>, pred: F) -> Option<ElementRef<'a>>
where
    F: Fn(&ElementRef<'a>) -> bool,
{
    scope
        .descendants()
        .skip_while(|node| node.id() != start.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| pred(el))
}

/// Resolve `href` against the page it was found on.
pub fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

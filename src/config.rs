use crate::CinemaScraper;
use crate::drexel::DrexelScraper;
use crate::gateway::GatewayScraper;
use crate::studio35::{PageSource, Studio35Scraper};
use chrono::{Datelike, Local};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Venue {
    Gateway,
    #[value(name = "studio35")]
    Studio35,
    Drexel,
}

impl Venue {
    pub const ALL: [Venue; 3] = [Venue::Gateway, Venue::Studio35, Venue::Drexel];
}

/// Scrape Gateway Film Center, Studio 35 and the Drexel Theatre into one JSON file
#[derive(Parser, Debug)]
#[command(name = "coming-attractions", version, about)]
pub struct Cli {
    /// Output file, overwritten on every run
    #[arg(short, long, env = "COMING_ATTRACTIONS_OUTPUT", default_value = "cinemas.json")]
    pub output: PathBuf,

    /// Only scrape these venues (repeatable); all of them by default
    #[arg(long = "venue", value_enum)]
    pub venues: Vec<Venue>,

    /// Year for showing dates printed without one (default: current year)
    #[arg(long, env = "COMING_ATTRACTIONS_YEAR")]
    pub year: Option<i32>,

    /// Per-request timeout in seconds
    #[arg(long, env = "COMING_ATTRACTIONS_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Log JSON lines instead of human readable output
    #[arg(long)]
    pub log_json: bool,

    /// WebDriver endpoint for rendering Studio 35 (e.g. http://localhost:9515)
    #[cfg(feature = "browser")]
    #[arg(long, env = "COMING_ATTRACTIONS_WEBDRIVER")]
    pub webdriver: Option<String>,
}

impl Cli {
    /// Requested venues in output order, without repeats.
    pub fn selected_venues(&self) -> Vec<Venue> {
        if self.venues.is_empty() {
            return Venue::ALL.to_vec();
        }
        Venue::ALL
            .into_iter()
            .filter(|v| self.venues.contains(v))
            .collect()
    }

    pub fn reference_year(&self) -> i32 {
        self.year.unwrap_or_else(|| Local::now().year())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    #[cfg(feature = "browser")]
    fn studio35_source(&self) -> PageSource {
        match &self.webdriver {
            Some(endpoint) => PageSource::WebDriver(endpoint.clone()),
            None => PageSource::Http,
        }
    }

    #[cfg(not(feature = "browser"))]
    fn studio35_source(&self) -> PageSource {
        PageSource::Http
    }

    pub fn scrapers(&self) -> Vec<Box<dyn CinemaScraper>> {
        let year = self.reference_year();
        self.selected_venues()
            .into_iter()
            .map(|venue| -> Box<dyn CinemaScraper> {
                match venue {
                    Venue::Gateway => Box::new(GatewayScraper::new()),
                    Venue::Studio35 => {
                        Box::new(Studio35Scraper::new(year).source(self.studio35_source()))
                    }
                    Venue::Drexel => Box::new(DrexelScraper::new(year)),
                }
            })
            .collect()
    }
}

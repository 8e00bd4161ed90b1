//! Monthly archive discovery and archive URL conventions.
//!
//! The blog exposes a single date-archives index page that links to one page
//! per calendar month, shaped like:
//!
//! ```text
//! https://marginalrevolution.com/marginalrevolution/2021/01
//! ```
//!
//! [`ArchiveSite`] owns that shape. It is used both to discover month URLs
//! and to infer a prediction's publish date from the URL it came from.

use crate::fetcher::{Fetcher, ReadService};
use crate::models::UNSPECIFIED;
use chrono::NaiveDate;
use regex::Regex;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// A blog whose posts are grouped into `<root>/<section>/<yyyy>/<mm>` pages.
#[derive(Debug, Clone)]
pub struct ArchiveSite {
    root: String,
    section: String,
    index_path: String,
    month_link: Regex,
    month_prefix: Regex,
}

impl ArchiveSite {
    /// Describe a site by its root URL, archive section and index page path.
    pub fn new(root: &str, section: &str, index_path: &str) -> Result<Self, Box<dyn Error>> {
        Url::parse(root)?;
        let root = root.trim_end_matches('/').to_string();
        let section = section.trim_matches('/').to_string();
        let index_path = index_path.trim_start_matches('/').to_string();

        let shape = format!(
            r"{}/{}/(\d{{4}})/(\d{{2}})",
            regex::escape(&root),
            regex::escape(&section)
        );
        let month_link = Regex::new(&shape)?;
        let month_prefix = Regex::new(&format!("^{shape}"))?;

        Ok(Self {
            root,
            section,
            index_path,
            month_link,
            month_prefix,
        })
    }

    #[cfg(test)]
    pub fn marginal_revolution() -> Result<Self, Box<dyn Error>> {
        Self::new(
            "https://marginalrevolution.com",
            "marginalrevolution",
            "date-archives",
        )
    }

    /// URL of the page listing every monthly archive.
    pub fn index_url(&self) -> String {
        format!("{}/{}", self.root, self.index_path)
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Every archive link in `text`, in order of appearance, duplicates kept.
    pub fn month_links(&self, text: &str) -> Vec<String> {
        self.month_link
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// First day of the archive month for `url` as `YYYY-MM-01`.
    ///
    /// Returns `unspecified` when `url` does not start with the archive shape
    /// or names a month that does not exist.
    pub fn publish_date(&self, url: &str) -> String {
        let Some(caps) = self.month_prefix.captures(url) else {
            return UNSPECIFIED.to_string();
        };
        let year = caps[1].parse::<i32>().ok();
        let month = caps[2].parse::<u32>().ok();

        match (year, month) {
            (Some(y), Some(m)) => NaiveDate::from_ymd_opt(y, m, 1)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| UNSPECIFIED.to_string()),
            _ => UNSPECIFIED.to_string(),
        }
    }
}

/// Discover the monthly archive URLs listed on the site's index page.
///
/// An unavailable index page yields an empty list.
#[instrument(level = "info", skip_all, fields(index = %site.index_url()))]
pub async fn list_months<S: ReadService>(fetcher: &Fetcher<S>, site: &ArchiveSite) -> Vec<String> {
    let Some(index) = fetcher.fetch(&site.index_url()).await else {
        warn!("Archive index unavailable; no months to process");
        return Vec::new();
    };

    let months = site.month_links(&index);
    info!(count = months.len(), "Indexed monthly archive URLs");
    debug!(urls = ?months, "Archive URLs");
    months
}

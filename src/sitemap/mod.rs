//! Sitemap augmentation.
//!
//! Appends extra `<url>` entries to a sitemap.xml produced by some other
//! tool (usually a static site generator) and writes it back in place.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <changefreq>daily</changefreq>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

mod augment;
mod document;
mod error;

pub use augment::{AugmentReport, augment};
pub use document::SitemapDocument;
pub use error::SitemapError;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Declaration emitted at the top of every written sitemap.
pub const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// How frequently the page is likely to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `<url>` element.
///
/// Entries read from disk keep `changefreq` and `lastmod` as raw strings,
/// since the document is never schema-checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlEntry {
    pub loc: String,
    pub changefreq: Option<String>,
    pub lastmod: Option<String>,
}

impl UrlEntry {
    pub fn new(loc: impl Into<String>, changefreq: ChangeFreq, lastmod: NaiveDate) -> Self {
        Self {
            loc: loc.into(),
            changefreq: Some(changefreq.as_str().to_owned()),
            lastmod: Some(lastmod.format("%Y-%m-%d").to_string()),
        }
    }
}

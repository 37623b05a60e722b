//! Sitemap processing errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, augmenting or writing a sitemap.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("XML syntax error at byte {position}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed sitemap at byte {position}: {reason}")]
    Malformed { position: u64, reason: String },

    #[error("root element is <{0}>, expected <urlset>")]
    NotASitemap(String),

    #[error("url #{index} has an empty loc")]
    EmptyLoc { index: usize },
}

impl SitemapError {
    pub(crate) fn malformed(position: u64, reason: impl Into<String>) -> Self {
        Self::Malformed {
            position,
            reason: reason.into(),
        }
    }
}

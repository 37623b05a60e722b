//! Configuration for `sitemap.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error    # ConfigError, ConfigDiagnostics
//! ├── field    # FieldPath names used in diagnostics
//! ├── util     # url/date checks, config file lookup
//! └── mod.rs   # AugmentConfig (this file)
//! ```
//!
//! # Fields
//!
//! | Field          | Purpose                                           |
//! |----------------|---------------------------------------------------|
//! | `sitemap_path` | Sitemap to augment, relative to the config file   |
//! | `urls`         | Urls appended as new `<url>` entries, in order    |
//! | `changefreq`   | `<changefreq>` of every appended entry            |
//! | `lastmod`      | Pin `<lastmod>` (`"YYYY-MM-DD"`) instead of today |
//!
//! Every field is optional. Without a config file the built-in defaults
//! apply, and CLI flags override whatever was loaded.

mod error;
mod field;
mod util;

pub use error::{ConfigDiagnostics, ConfigError};
pub use field::FieldPath;

use util::{check_url, find_config_file, parse_date};

use crate::{cli::Cli, debug, log, sitemap::ChangeFreq};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file name searched for when `--config` is not given.
pub const DEFAULT_CONFIG_NAME: &str = "sitemap.toml";

/// Where MkDocs writes its sitemap.
pub const DEFAULT_SITEMAP_PATH: &str = "docs/site/sitemap.xml";

/// Pages served outside the generated site.
pub const DEFAULT_URLS: [&str; 3] = [
    "https://django-ninja.cn/online-tools/py312run/console.html",
    "https://django-ninja.cn/online-tools/996-Salary-Calculator/",
    "https://django-ninja.cn/online-tools/python-tutor/",
];

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sitemap.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Directory of the config file, or cwd without one (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Sitemap file to augment
    pub sitemap_path: PathBuf,

    /// Urls to append, in order
    pub urls: Vec<String>,

    /// `<changefreq>` for appended entries
    pub changefreq: ChangeFreq,

    /// Fixed `<lastmod>` date, `YYYY-MM-DD`
    pub lastmod: Option<String>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            sitemap_path: DEFAULT_SITEMAP_PATH.into(),
            urls: DEFAULT_URLS.iter().map(|url| (*url).to_owned()).collect(),
            changefreq: ChangeFreq::default(),
            lastmod: None,
        }
    }
}

impl AugmentConfig {
    /// Load configuration from CLI arguments.
    ///
    /// An explicit `--config` must exist. Otherwise `sitemap.toml` is
    /// searched upward from cwd and the defaults apply if it is missing.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = match &cli.config {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(ConfigError::Io(
                        path,
                        std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                    )
                    .into());
                }
                Some(path)
            }
            None => find_config_file(Path::new(DEFAULT_CONFIG_NAME)),
        };

        let mut config = match &config_path {
            Some(path) => {
                debug!("config"; "loading {}", path.display());
                Self::from_path(path)?
            }
            None => {
                debug!("config"; "no {} found, using defaults", DEFAULT_CONFIG_NAME);
                Self::default()
            }
        };

        config.root = config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or(cwd, Path::to_path_buf);
        config.apply_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text.
    #[cfg(test)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "ignoring unknown fields in {}: {}", display_path, fields.join(", "));
    }

    /// Apply CLI overrides on top of the loaded values.
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.sitemap {
            self.sitemap_path.clone_from(path);
        }
        if !cli.urls.is_empty() {
            self.urls.clone_from(&cli.urls);
        }
        if let Some(changefreq) = cli.changefreq {
            self.changefreq = changefreq;
        }
        if let Some(date) = &cli.date {
            self.lastmod = Some(date.clone());
        }
    }

    /// Validate every field, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.sitemap_path.as_os_str().is_empty() {
            diag.error(FieldPath::SITEMAP_PATH, "must not be empty");
        }

        if self.urls.is_empty() {
            diag.warn(
                FieldPath::URLS,
                "no urls configured, the sitemap will only be re-serialized",
            );
        }
        for (index, url) in self.urls.iter().enumerate() {
            if let Err(reason) = check_url(url) {
                diag.error_with_hint(
                    FieldPath::URLS,
                    format!("url #{index} `{url}` {reason}"),
                    "use an absolute url such as `https://example.com/page/`",
                );
            }
        }

        if let Some(date) = &self.lastmod
            && parse_date(date).is_none()
        {
            diag.error_with_hint(
                FieldPath::LASTMOD,
                format!("`{date}` is not a valid date"),
                "use the `YYYY-MM-DD` format, e.g. \"2024-05-01\"",
            );
        }

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// Sitemap path, resolved against the config root when relative.
    pub fn sitemap_path(&self) -> PathBuf {
        if self.sitemap_path.is_absolute() {
            self.sitemap_path.clone()
        } else {
            self.root.join(&self.sitemap_path)
        }
    }

    /// Date written as `<lastmod>`: the pinned date, or today's local date.
    pub fn processing_date(&self) -> NaiveDate {
        self.lastmod
            .as_deref()
            .and_then(parse_date)
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

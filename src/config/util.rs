//! Configuration utility functions.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Check that `url` is an absolute http(s) url with a host.
///
/// Returns a short reason on failure, phrased to follow the url itself:
/// ```ignore
/// check_url("https://example.com/page/") -> Ok(())
/// check_url("/page/")                    -> Err("is not an absolute url ...")
/// check_url("ftp://example.com/")        -> Err("has unsupported scheme `ftp`")
/// ```
pub fn check_url(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("is empty".into());
    }

    let parsed = url::Url::parse(url).map_err(|err| format!("is not an absolute url ({err})"))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(format!("has unsupported scheme `{scheme}`")),
    }

    if !parsed.has_host() {
        return Err("has no host".into());
    }

    Ok(())
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/site/docs/         ← cwd
/// /home/user/site/sitemap.toml  ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

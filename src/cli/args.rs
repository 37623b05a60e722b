//! Command-line interface definitions.

use crate::sitemap::ChangeFreq;
use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Append custom url entries to an existing sitemap.xml
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: sitemap.toml, searched upward from cwd)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Sitemap file to augment (relative to the config file's directory)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub sitemap: Option<PathBuf>,

    /// Url to append; repeat for several. Replaces the configured list
    #[arg(short = 'u', long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Change frequency written for every appended url
    #[arg(long, value_enum)]
    pub changefreq: Option<ChangeFreq>,

    /// Use this date (YYYY-MM-DD) as lastmod instead of today
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,

    /// Print the augmented sitemap to stdout instead of writing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show debug output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments() {
        let cli = Cli::parse_from(["sitemap-augment"]);
        assert!(cli.config.is_none());
        assert!(cli.sitemap.is_none());
        assert!(cli.urls.is_empty());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_repeated_urls_keep_order() {
        let cli = Cli::parse_from([
            "sitemap-augment",
            "-u",
            "https://b.test/",
            "-u",
            "https://a.test/",
            "--changefreq",
            "hourly",
            "-n",
        ]);
        assert_eq!(cli.urls, ["https://b.test/", "https://a.test/"]);
        assert_eq!(cli.changefreq, Some(ChangeFreq::Hourly));
        assert!(cli.dry_run);
    }

    #[test]
    fn test_invalid_changefreq_rejected() {
        assert!(Cli::try_parse_from(["sitemap-augment", "--changefreq", "often"]).is_err());
    }
}

//! The augment command: check the sitemap exists, append, report.

use crate::{
    config::AugmentConfig,
    debug, log,
    sitemap::{AugmentReport, SITEMAP_NS, SitemapDocument, augment},
};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The sitemap was rewritten with the new entries.
    Updated(AugmentReport),
    /// `--dry-run`: the result went to `out`, the file is untouched.
    Previewed { existing: usize, appended: usize },
    /// Nothing to augment.
    NotFound(PathBuf),
}

/// Append the configured urls to the configured sitemap.
///
/// A missing sitemap is reported and is not an error. With `dry_run` the
/// resulting document is written to `out` instead of the sitemap, so log
/// output must not share that stream.
pub fn run(config: &AugmentConfig, dry_run: bool, out: &mut impl Write) -> Result<Outcome> {
    let path = config.sitemap_path();
    if !path.is_file() {
        log!("sitemap"; "not found: {}", path.display());
        return Ok(Outcome::NotFound(path));
    }

    let date = config.processing_date();
    debug!("sitemap"; "appending {} url(s) to {} with changefreq={} lastmod={}",
        config.urls.len(), path.display(), config.changefreq, date);

    if dry_run {
        let mut doc = SitemapDocument::read(&path)?;
        let appended = doc.append_urls(&config.urls, config.changefreq, date)?;
        warn_namespace(doc.namespace());

        out.write_all(doc.to_xml().as_bytes())?;
        out.flush()?;

        return Ok(Outcome::Previewed {
            existing: doc.existing_len(),
            appended,
        });
    }

    let report = augment(&path, &config.urls, config.changefreq, date)
        .with_context(|| format!("Failed to augment sitemap {}", path.display()))?;
    warn_namespace(report.namespace.as_deref());

    log!("sitemap"; "updated {} ({} existing, {} appended)",
        report.path.display(), report.existing, report.appended);
    Ok(Outcome::Updated(report))
}

fn warn_namespace(namespace: Option<&str>) {
    if namespace != Some(SITEMAP_NS) {
        log!("warning"; "root element is not in the {} namespace", SITEMAP_NS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sitemap::XML_DECL;
    use std::fs;
    use tempfile::TempDir;

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/</loc>
  </url>
</urlset>
"#;

    fn config_in(dir: &TempDir, urls: &[&str]) -> AugmentConfig {
        AugmentConfig {
            root: dir.path().to_path_buf(),
            sitemap_path: PathBuf::from("site/sitemap.xml"),
            urls: urls.iter().map(|url| (*url).to_owned()).collect(),
            lastmod: Some("2024-05-01".into()),
            ..Default::default()
        }
    }

    fn write_sitemap(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("site/sitemap.xml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_run_updates_sitemap() {
        let dir = TempDir::new().unwrap();
        let path = write_sitemap(&dir, SITEMAP);

        let outcome = run(&config_in(&dir, &["https://a.test/"]), false, &mut Vec::new()).unwrap();
        let Outcome::Updated(report) = outcome else {
            panic!("expected update, got {outcome:?}");
        };
        assert_eq!(report.existing, 1);
        assert_eq!(report.appended, 1);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(written.contains(
            "  <url>\n    <loc>https://a.test/</loc>\n    <changefreq>daily</changefreq>\n    <lastmod>2024-05-01</lastmod>\n  </url>\n</urlset>"
        ));
    }

    #[test]
    fn test_run_missing_sitemap() {
        let dir = TempDir::new().unwrap();

        let outcome = run(&config_in(&dir, &["https://a.test/"]), false, &mut Vec::new()).unwrap();
        assert_eq!(outcome, Outcome::NotFound(dir.path().join("site/sitemap.xml")));
        assert!(!dir.path().join("site").exists());
    }

    #[test]
    fn test_run_malformed_sitemap() {
        let dir = TempDir::new().unwrap();
        let path = write_sitemap(&dir, "<urlset><url>");

        assert!(run(&config_in(&dir, &["https://a.test/"]), false, &mut Vec::new()).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "<urlset><url>");
    }

    #[test]
    fn test_run_dry_run_leaves_file() {
        let dir = TempDir::new().unwrap();
        let path = write_sitemap(&dir, SITEMAP);

        let mut out = Vec::new();
        let config = config_in(&dir, &["https://a.test/", "https://b.test/"]);
        let outcome = run(&config, true, &mut out).unwrap();
        assert_eq!(
            outcome,
            Outcome::Previewed {
                existing: 1,
                appended: 2
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), SITEMAP);

        let preview = String::from_utf8(out).unwrap();
        assert!(preview.starts_with(XML_DECL));
        assert!(preview.ends_with("</urlset>\n"));
        assert_eq!(preview.matches("<url>").count(), 3);
    }

    #[test]
    fn test_run_writes_nothing_to_out_without_dry_run() {
        let dir = TempDir::new().unwrap();
        write_sitemap(&dir, SITEMAP);

        let mut out = Vec::new();
        run(&config_in(&dir, &["https://a.test/"]), false, &mut out).unwrap();
        assert!(out.is_empty());
    }
}

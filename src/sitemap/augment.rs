//! Read, append and write back in a single pass.

use super::{ChangeFreq, SitemapDocument, SitemapError};
use chrono::NaiveDate;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Summary of a completed augmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentReport {
    pub path: PathBuf,
    pub existing: usize,
    pub appended: usize,
    /// Namespace declared on the root element.
    pub namespace: Option<String>,
}

/// Append one `<url>` per entry of `urls` to the sitemap at `path`.
///
/// The file is replaced atomically, and only after parsing succeeded, so a
/// malformed sitemap is left as it was. The caller is expected to have
/// checked that `path` exists.
pub fn augment<S: AsRef<str>>(
    path: &Path,
    urls: &[S],
    changefreq: ChangeFreq,
    lastmod: NaiveDate,
) -> Result<AugmentReport, SitemapError> {
    let mut doc = SitemapDocument::read(path)?;
    let appended = doc.append_urls(urls, changefreq, lastmod)?;

    write_atomic(path, doc.to_xml().as_bytes())?;

    Ok(AugmentReport {
        path: path.to_path_buf(),
        existing: doc.existing_len(),
        appended,
        namespace: doc.namespace().map(str::to_owned),
    })
}

/// Write to a sibling temp file, then rename it over `path`.
///
/// A symlinked `path` stays a symlink: the file it points to is replaced.
/// The replacement keeps the permissions of the file it replaces.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), SitemapError> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let tmp = temp_path(&target);

    let result = fs::write(&tmp, content)
        .and_then(|()| match fs::metadata(&target) {
            Ok(meta) => fs::set_permissions(&tmp, meta.permissions()),
            Err(_) => Ok(()),
        })
        .map_err(|err| SitemapError::Io(tmp.clone(), err))
        .and_then(|()| {
            fs::rename(&tmp, &target).map_err(|err| SitemapError::Io(path.to_path_buf(), err))
        });

    if result.is_err() {
        fs::remove_file(&tmp).ok();
    }
    result
}

/// `dir/sitemap.xml` -> `dir/.sitemap.xml.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sitemap.xml".to_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sitemap::{SITEMAP_NS, XML_DECL};
    use tempfile::TempDir;

    const LOWERCASE_DECL: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn write_sitemap(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("sitemap.xml");
        fs::write(&path, content).unwrap();
        path
    }

    fn one_entry_sitemap() -> String {
        format!(
            "{LOWERCASE_DECL}\n<urlset xmlns=\"{SITEMAP_NS}\"><url><loc>https://example.com/</loc></url></urlset>\n"
        )
    }

    #[test]
    fn test_augment_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = write_sitemap(&dir, &one_entry_sitemap());

        let report = augment(&path, &["https://a.test/"], ChangeFreq::Daily, date()).unwrap();
        assert_eq!(report.existing, 1);
        assert_eq!(report.appended, 1);
        assert_eq!(report.path, path);
        assert_eq!(report.namespace.as_deref(), Some(SITEMAP_NS));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with(&format!("{XML_DECL}\n")));
        assert!(!written.contains(LOWERCASE_DECL));

        let doc = SitemapDocument::parse(written).unwrap();
        assert_eq!(doc.entries().len(), 2);
        assert_eq!(doc.entries()[0].loc, "https://example.com/");
        assert_eq!(doc.entries()[1].loc, "https://a.test/");
        assert_eq!(doc.entries()[1].changefreq.as_deref(), Some("daily"));
        assert_eq!(doc.entries()[1].lastmod.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn test_augment_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = write_sitemap(&dir, &one_entry_sitemap());

        augment(&path, &["https://a.test/"], ChangeFreq::Daily, date()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["sitemap.xml"]);
    }

    #[test]
    fn test_augment_twice_duplicates_entries() {
        let dir = TempDir::new().unwrap();
        let path = write_sitemap(&dir, &one_entry_sitemap());
        let urls = ["https://a.test/", "https://b.test/"];

        augment(&path, &urls, ChangeFreq::Daily, date()).unwrap();
        let report = augment(&path, &urls, ChangeFreq::Daily, date()).unwrap();
        assert_eq!(report.existing, 3);

        let doc = SitemapDocument::read(&path).unwrap();
        let locs: Vec<_> = doc.entries().iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            [
                "https://example.com/",
                "https://a.test/",
                "https://b.test/",
                "https://a.test/",
                "https://b.test/",
            ]
        );
    }

    #[test]
    fn test_malformed_file_untouched() {
        let dir = TempDir::new().unwrap();
        let broken = format!("{LOWERCASE_DECL}\n<urlset><url><loc>https://example.com/</loc></url>");
        let path = write_sitemap(&dir, &broken);

        let err = augment(&path, &["https://a.test/"], ChangeFreq::Daily, date()).unwrap_err();
        assert!(matches!(
            err,
            SitemapError::Xml { .. } | SitemapError::Malformed { .. }
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sitemap.xml");

        let err = augment(&path, &["https://a.test/"], ChangeFreq::Daily, date()).unwrap_err();
        assert!(matches!(err, SitemapError::Io(p, _) if p == path));
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("site");
        fs::create_dir_all(target.join("nested")).unwrap();

        let err = write_atomic(&target, b"<urlset/>").unwrap_err();
        assert!(matches!(err, SitemapError::Io(p, _) if p == target));
        assert!(!temp_path(&fs::canonicalize(&target).unwrap()).exists());
        assert!(target.join("nested").is_dir());
    }

    #[test]
    fn test_failed_temp_write_leaves_original() {
        let dir = TempDir::new().unwrap();
        let path = write_sitemap(&dir, &one_entry_sitemap());
        // Occupy the temp file name so it cannot be written.
        let tmp = temp_path(&fs::canonicalize(&path).unwrap());
        fs::create_dir(&tmp).unwrap();

        let err = augment(&path, &["https://a.test/"], ChangeFreq::Daily, date()).unwrap_err();
        assert!(matches!(err, SitemapError::Io(p, _) if p == tmp));
        assert_eq!(fs::read_to_string(&path).unwrap(), one_entry_sitemap());
    }

    #[cfg(unix)]
    #[test]
    fn test_augment_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write_sitemap(&dir, &one_entry_sitemap());
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        augment(&path, &["https://a.test/"], ChangeFreq::Daily, date()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_augment_through_symlink() {
        let dir = TempDir::new().unwrap();
        let real = write_sitemap(&dir, &one_entry_sitemap());
        let link = dir.path().join("link.xml");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let report = augment(&link, &["https://a.test/"], ChangeFreq::Daily, date()).unwrap();
        assert_eq!(report.path, link);

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert!(fs::read_to_string(&real).unwrap().contains("<loc>https://a.test/</loc>"));
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("docs/site/sitemap.xml")),
            PathBuf::from("docs/site/.sitemap.xml.tmp")
        );
    }
}

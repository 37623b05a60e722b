//! Config field paths used in diagnostics.

/// Name of a field in `sitemap.toml`, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    pub const SITEMAP_PATH: Self = Self("sitemap_path");
    pub const URLS: Self = Self("urls");
    pub const LASTMOD: Self = Self("lastmod");

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

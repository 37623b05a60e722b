//! In-memory sitemap document.
//!
//! The source text is scanned once with `quick-xml` to check that it is
//! well-formed, collect the existing `<url>` entries and locate the end of
//! the root element. Serialization then copies the original bytes untouched
//! and splices the appended entries in front of `</urlset>`, so existing
//! entries survive exactly as the generator wrote them.

use super::{ChangeFreq, SitemapError, UrlEntry, XML_DECL};
use chrono::NaiveDate;
use quick_xml::{
    Reader,
    escape::{escape, unescape},
    events::{BytesStart, Event},
};
use std::{borrow::Cow, fs, path::Path};

/// Where the root element ends in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootClose {
    /// Byte offset of the closing `</urlset>` tag.
    Tag(usize),
    /// Byte span of a self-closing `<urlset .../>`.
    Empty { start: usize, end: usize },
}

/// Whitespace layout used for appended entries.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// Everything on one line, as minified generators emit it.
    Compact,
    /// One element per line, nested with the given indent unit and
    /// terminated by the document's own line ending.
    Pretty { indent: String, newline: &'static str },
}

#[derive(Clone, Copy)]
enum Field {
    Loc,
    ChangeFreq,
    LastMod,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"loc" => Some(Self::Loc),
            b"changefreq" => Some(Self::ChangeFreq),
            b"lastmod" => Some(Self::LastMod),
            _ => None,
        }
    }

    fn assign(self, entry: &mut UrlEntry, value: String) {
        match self {
            Self::Loc => entry.loc = value,
            Self::ChangeFreq => entry.changefreq = Some(value),
            Self::LastMod => entry.lastmod = Some(value),
        }
    }
}

/// A parsed sitemap plus the entries appended to it.
#[derive(Debug, Clone)]
pub struct SitemapDocument {
    source: String,
    /// First byte after the original XML declaration (0 if there was none).
    body_start: usize,
    /// Qualified name of the root element, e.g. `urlset` or `sm:urlset`.
    root_name: String,
    namespace: Option<String>,
    close: RootClose,
    layout: Layout,
    entries: Vec<UrlEntry>,
    existing: usize,
}

/// Everything `scan` learns about the source text.
struct Scan {
    body_start: usize,
    root_name: String,
    namespace: Option<String>,
    close: RootClose,
    layout: Layout,
    entries: Vec<UrlEntry>,
}

impl SitemapDocument {
    /// Read and parse a sitemap file.
    pub fn read(path: &Path) -> Result<Self, SitemapError> {
        let source =
            fs::read_to_string(path).map_err(|err| SitemapError::Io(path.to_path_buf(), err))?;
        Self::parse(source)
    }

    /// Parse sitemap source text.
    pub fn parse(source: impl Into<String>) -> Result<Self, SitemapError> {
        let mut source = source.into();
        if source.starts_with('\u{feff}') {
            source.replace_range(..'\u{feff}'.len_utf8(), "");
        }

        let scan = scan(&source)?;
        let existing = scan.entries.len();

        Ok(Self {
            source,
            body_start: scan.body_start,
            root_name: scan.root_name,
            namespace: scan.namespace,
            close: scan.close,
            layout: scan.layout,
            entries: scan.entries,
            existing,
        })
    }

    /// All entries in document order: existing ones first, then appended ones.
    #[cfg(test)]
    pub fn entries(&self) -> &[UrlEntry] {
        &self.entries
    }

    /// Number of entries that were already in the source.
    pub fn existing_len(&self) -> usize {
        self.existing
    }

    /// Entries added since parsing.
    pub fn appended(&self) -> &[UrlEntry] {
        &self.entries[self.existing..]
    }

    /// Namespace URI declared on the root element, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Append one entry per url, all sharing `changefreq` and `lastmod`.
    ///
    /// Nothing is appended if any url is empty. Urls already present in the
    /// document are appended again.
    pub fn append_urls<S: AsRef<str>>(
        &mut self,
        urls: &[S],
        changefreq: ChangeFreq,
        lastmod: NaiveDate,
    ) -> Result<usize, SitemapError> {
        if let Some(index) = urls.iter().position(|url| url.as_ref().trim().is_empty()) {
            return Err(SitemapError::EmptyLoc { index });
        }

        self.entries.extend(
            urls.iter()
                .map(|url| UrlEntry::new(url.as_ref(), changefreq, lastmod)),
        );
        Ok(urls.len())
    }

    /// Serialize the document with the canonical UTF-8 declaration.
    pub fn to_xml(&self) -> String {
        let appended = self.appended();
        let mut xml =
            String::with_capacity(self.source.len() + XML_DECL.len() + appended.len() * 160);

        xml.push_str(XML_DECL);
        if self.body_start == 0 && !self.source.starts_with(['\n', '\r']) {
            xml.push_str(line_ending(&self.source));
        }

        match self.close {
            RootClose::Tag(at) => {
                xml.push_str(&self.source[self.body_start..at]);
                self.push_entries(&mut xml, appended);
                xml.push_str(&self.source[at..]);
            }
            RootClose::Empty { start, end } => {
                xml.push_str(&self.source[self.body_start..start]);
                if appended.is_empty() {
                    xml.push_str(&self.source[start..end]);
                } else {
                    let open = self.source[start..end].trim_end_matches("/>").trim_end();
                    xml.push_str(open);
                    xml.push('>');
                    self.push_entries(&mut xml, appended);
                    xml.push_str("</");
                    xml.push_str(&self.root_name);
                    xml.push('>');
                }
                xml.push_str(&self.source[end..]);
            }
        }

        xml
    }

    /// Qualify a child element name with the root's prefix, if it has one.
    fn qualify<'a>(&self, local: &'a str) -> Cow<'a, str> {
        match self.root_name.split_once(':') {
            Some((prefix, _)) => Cow::Owned(format!("{prefix}:{local}")),
            None => Cow::Borrowed(local),
        }
    }

    fn push_entries(&self, xml: &mut String, entries: &[UrlEntry]) {
        let (outer, inner, newline) = match &self.layout {
            Layout::Compact => (String::new(), String::new(), ""),
            Layout::Pretty { indent, newline } => (indent.clone(), indent.repeat(2), *newline),
        };

        // `</url></urlset>` on one line
        if !entries.is_empty() && !newline.is_empty() && !xml.ends_with('\n') {
            xml.push_str(newline);
        }

        let url = self.qualify("url");
        for entry in entries {
            xml.push_str(&outer);
            push_open(xml, &url);
            xml.push_str(newline);

            push_field(xml, &inner, &self.qualify("loc"), &entry.loc, newline);
            if let Some(changefreq) = &entry.changefreq {
                push_field(xml, &inner, &self.qualify("changefreq"), changefreq, newline);
            }
            if let Some(lastmod) = &entry.lastmod {
                push_field(xml, &inner, &self.qualify("lastmod"), lastmod, newline);
            }

            xml.push_str(&outer);
            push_close(xml, &url);
            xml.push_str(newline);
        }
    }
}

fn push_open(xml: &mut String, name: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
}

fn push_close(xml: &mut String, name: &str) {
    xml.push_str("</");
    xml.push_str(name);
    xml.push('>');
}

fn push_field(xml: &mut String, indent: &str, name: &str, value: &str, newline: &str) {
    xml.push_str(indent);
    push_open(xml, name);
    xml.push_str(&escape(value));
    push_close(xml, name);
    xml.push_str(newline);
}

// ============================================================================
// Scanning
// ============================================================================

fn scan(source: &str) -> Result<Scan, SitemapError> {
    let mut reader = Reader::from_str(source);

    let mut body_start = 0;
    let mut root: Option<(String, Option<String>)> = None;
    let mut root_open_end = 0;
    let mut close = None;
    let mut layout = None;

    let mut depth = 0usize;
    let mut entries = Vec::new();
    let mut current: Option<UrlEntry> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        let start = reader.buffer_position();
        let event = reader.read_event().map_err(|source| SitemapError::Xml {
            position: reader.error_position(),
            source,
        })?;
        let end = reader.buffer_position();

        match event {
            Event::Decl(_) if start == 0 => body_start = end as usize,
            Event::Decl(_) => {
                return Err(SitemapError::malformed(
                    start,
                    "XML declaration is not at the start of the document",
                ));
            }
            Event::Start(e) => {
                match depth {
                    0 => {
                        root = Some(open_root(&e, start, close.is_some())?);
                        root_open_end = end as usize;
                    }
                    1 => {
                        if layout.is_none() {
                            layout = Some(detect_layout(source, root_open_end, start as usize));
                        }
                        if e.local_name().as_ref() == b"url" {
                            current = Some(UrlEntry::default());
                        }
                    }
                    2 if current.is_some() => {
                        field = Field::from_local_name(e.local_name().as_ref());
                        text.clear();
                    }
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(e) => match depth {
                0 => {
                    root = Some(open_root(&e, start, close.is_some())?);
                    close = Some(RootClose::Empty {
                        start: start as usize,
                        end: end as usize,
                    });
                }
                1 => {
                    if layout.is_none() {
                        layout = Some(detect_layout(source, root_open_end, start as usize));
                    }
                    if e.local_name().as_ref() == b"url" {
                        entries.push(UrlEntry::default());
                    }
                }
                _ => {}
            },
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SitemapError::malformed(start, "unexpected closing tag"))?;
                match depth {
                    0 => close = Some(RootClose::Tag(start as usize)),
                    1 => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    2 => {
                        if let (Some(f), Some(entry)) = (field.take(), current.as_mut()) {
                            let value = unescape(text.trim())
                                .map_err(|err| SitemapError::malformed(start, err.to_string()))?;
                            f.assign(entry, value.into_owned());
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                let raw = utf8(&t, start)?;
                if field.is_some() {
                    text.push_str(raw);
                } else if depth == 0 && !raw.trim().is_empty() {
                    return Err(SitemapError::malformed(
                        start,
                        "text outside the root element",
                    ));
                }
            }
            Event::GeneralRef(r) => {
                if field.is_some() {
                    text.push('&');
                    text.push_str(utf8(&r, start)?);
                    text.push(';');
                } else if depth == 0 {
                    return Err(SitemapError::malformed(
                        start,
                        "entity reference outside the root element",
                    ));
                }
            }
            Event::CData(c) => {
                if field.is_some() {
                    text.push_str(&escape(utf8(&c, start)?));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let eof = source.len() as u64;
    let (root_name, namespace) =
        root.ok_or_else(|| SitemapError::malformed(eof, "document has no root element"))?;
    if depth != 0 {
        return Err(SitemapError::malformed(
            eof,
            format!("<{root_name}> is never closed"),
        ));
    }
    let close = close.ok_or_else(|| {
        SitemapError::malformed(eof, format!("<{root_name}> is never closed"))
    })?;

    // An empty but multi-line root still gets one element per line.
    let layout = layout.unwrap_or_else(|| match close {
        RootClose::Tag(at) if source[root_open_end..at].contains('\n') => Layout::Pretty {
            indent: "  ".into(),
            newline: line_ending(&source[root_open_end..at]),
        },
        _ => Layout::Compact,
    });

    Ok(Scan {
        body_start,
        root_name,
        namespace,
        close,
        layout,
        entries,
    })
}

/// Check the root element and pull out its namespace declaration.
fn open_root(
    e: &BytesStart<'_>,
    position: u64,
    closed: bool,
) -> Result<(String, Option<String>), SitemapError> {
    if closed {
        return Err(SitemapError::malformed(
            position,
            "document has more than one root element",
        ));
    }

    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    if e.local_name().as_ref() != b"urlset" {
        return Err(SitemapError::NotASitemap(name));
    }

    let xmlns = match name.split_once(':') {
        Some((prefix, _)) => format!("xmlns:{prefix}"),
        None => "xmlns".to_owned(),
    };
    let namespace = e
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == xmlns.as_bytes())
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned());

    Ok((name, namespace))
}

/// Infer the indent of root children from the whitespace before the first one.
fn detect_layout(source: &str, root_open_end: usize, child_start: usize) -> Layout {
    source
        .get(root_open_end..child_start)
        .and_then(|gap| gap.rsplit_once('\n'))
        .filter(|(_, indent)| !indent.is_empty() && indent.chars().all(|c| c == ' ' || c == '\t'))
        .map_or(Layout::Compact, |(line, indent)| Layout::Pretty {
            indent: indent.to_owned(),
            newline: if line.ends_with('\r') { "\r\n" } else { "\n" },
        })
}

/// `\r\n` if the text uses Windows line endings, `\n` otherwise.
fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

fn utf8(bytes: &[u8], position: u64) -> Result<&str, SitemapError> {
    std::str::from_utf8(bytes).map_err(|err| SitemapError::malformed(position, err.to_string()))
}

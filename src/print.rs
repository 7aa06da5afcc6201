//! Print Document Adapter
//!
//! Converts a [`VectorDocument`] into PDF bytes. Either the whole document
//! converts or a [`RenderingError`] comes back; partial output is never
//! returned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};
use svg2pdf::usvg;
use thiserror::Error;

use crate::svg::{VectorDocument, SVG_NAMESPACE};

/// Every successful conversion starts with these bytes.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

#[derive(Debug, Error)]
pub enum RenderingError {
    #[error("namespace `{prefix}` is used but never declared")]
    MissingNamespace { prefix: String },

    #[error("vector document is empty")]
    EmptyDocument,

    #[error("malformed vector markup: {0}")]
    MalformedMarkup(String),

    #[error("print conversion failed: {0}")]
    Conversion(String),

    #[error("converter output does not start with the PDF header")]
    InvalidHeader,
}

/// PrintAuthority determines where print specifications come from.
/// This prevents if/else sprawl throughout the codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintAuthority {
    /// System defaults (fallback)
    System,
    /// User-provided overrides (with validation)
    User,
}

impl Default for PrintAuthority {
    fn default() -> Self {
        Self::System
    }
}

/// How vector user units map onto the printed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintSpec {
    pub authority: PrintAuthority,
    /// User units per inch; 72 makes one unit one point.
    pub dpi: u32,
    pub compress: bool,
}

impl Default for PrintSpec {
    fn default() -> Self {
        Self {
            authority: PrintAuthority::System,
            dpi: 72,
            compress: true,
        }
    }
}

impl PrintSpec {
    /// Create from user with validation
    pub fn from_user(dpi: u32, compress: bool) -> Result<Self, &'static str> {
        if !(72..=1200).contains(&dpi) {
            return Err("DPI must be between 72 and 1200");
        }
        Ok(Self {
            authority: PrintAuthority::User,
            dpi,
            compress,
        })
    }
}

/// A finished print document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintDocument {
    bytes: Vec<u8>,
}

impl PrintDocument {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// System fonts, loaded once per process.
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            log::debug!("loaded {} font faces for print conversion", db.len());
            Arc::new(db)
        })
        .clone()
}

/// Convert with the system print specification.
pub fn render_print_document(document: &VectorDocument) -> Result<PrintDocument, RenderingError> {
    render_print_document_with(document, &PrintSpec::default())
}

pub fn render_print_document_with(document: &VectorDocument, spec: &PrintSpec) -> Result<PrintDocument, RenderingError> {
    let markup = document.as_str();
    if markup.trim().is_empty() {
        return Err(RenderingError::EmptyDocument);
    }
    check_namespaces(markup)?;

    let mut options = usvg::Options::default();
    options.dpi = spec.dpi as f32;
    options.fontdb = font_database();

    let tree = usvg::Tree::from_str(markup, &options)
        .map_err(|e| RenderingError::MalformedMarkup(e.to_string()))?;

    let conversion = svg2pdf::ConversionOptions {
        compress: spec.compress,
        ..Default::default()
    };
    let page = svg2pdf::PageOptions { dpi: spec.dpi as f32 };
    let bytes = svg2pdf::to_pdf(&tree, conversion, page)
        .map_err(|e| RenderingError::Conversion(format!("{:?}", e)))?;

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(RenderingError::InvalidHeader);
    }
    log::info!("print document rendered: {} bytes", bytes.len());
    Ok(PrintDocument { bytes })
}

/// Reject markup that uses a namespace prefix it never declares, or whose
/// root lacks the SVG namespace.
pub fn check_namespaces(markup: &str) -> Result<(), RenderingError> {
    if !markup.contains(&format!("xmlns=\"{}\"", SVG_NAMESPACE)) {
        return Err(RenderingError::MissingNamespace { prefix: "svg".to_string() });
    }

    let mut declared: BTreeSet<&str> = BTreeSet::from(["xml", "xmlns"]);
    let mut used: BTreeSet<&str> = BTreeSet::new();
    for tag in tags(markup) {
        for name in tag_names(tag) {
            match name.split_once(':') {
                Some(("xmlns", prefix)) => {
                    declared.insert(prefix);
                }
                Some((prefix, _)) => {
                    used.insert(prefix);
                }
                None => {}
            }
        }
    }

    match used.difference(&declared).next() {
        Some(prefix) => Err(RenderingError::MissingNamespace { prefix: prefix.to_string() }),
        None => Ok(()),
    }
}

/// Contents of every element tag, without the angle brackets. Whole
/// comments, CDATA sections, processing instructions and doctypes are
/// skipped, so markup-like text inside them is never read as a tag.
fn tags(markup: &str) -> Vec<&str> {
    const SKIPPED: [(&str, &str); 4] = [("<!--", "-->"), ("<![CDATA[", "]]>"), ("<?", "?>"), ("<!", ">")];

    let mut tags = vec![];
    let mut rest = markup;
    while let Some(start) = rest.find('<') {
        rest = &rest[start..];
        if let Some((open, close)) = SKIPPED.into_iter().find(|&(open, _)| rest.starts_with(open)) {
            match rest[open.len()..].find(close) {
                Some(end) => rest = &rest[open.len() + end + close.len()..],
                None => break,
            }
            continue;
        }
        let Some(end) = rest.find('>') else {
            break;
        };
        tags.push(rest[1..end].trim_start_matches('/'));
        rest = &rest[end + 1..];
    }
    tags
}

/// Element name followed by attribute names of one tag.
fn tag_names(tag: &str) -> Vec<&str> {
    let is_break = |c: char| c.is_whitespace() || c == '/' || c == '=';
    let end = tag.find(is_break).unwrap_or(tag.len());
    let mut names = vec![&tag[..end]];
    let mut rest = &tag[end..];

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }
        let end = rest.find(is_break).unwrap_or(rest.len());
        if end > 0 {
            names.push(&rest[..end]);
        }
        rest = rest[end..].trim_start();

        let Some(value) = rest.strip_prefix('=') else {
            continue;
        };
        let value = value.trim_start();
        rest = match value.chars().next() {
            Some(quote @ ('"' | '\'')) => match value[1..].find(quote) {
                Some(close) => &value[close + 2..],
                None => break,
            },
            Some(_) => {
                let end = value.find(char::is_whitespace).unwrap_or(value.len());
                &value[end..]
            }
            None => break,
        };
    }
    names
}

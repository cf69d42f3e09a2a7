//! Locate and materialize the data literal a content module exports.
//!
//! A content module is trusted by convention to hold one data export,
//! either `export default <literal>` or `export const name = <literal>`.
//! Export sites are found with a pattern match that ignores text inside
//! strings and comments; the literal itself is read by the restricted
//! parser in [`literal`], never evaluated.

pub mod literal;

use std::ops::Range;
use std::sync::LazyLock;

use regex::bytes::Regex;
use serde_json::{Map, Value};
use tracing::trace;

use corpusgen_shared::{CorpusError, ExtractConfig};

pub use literal::{LiteralError, LiteralErrorKind, LiteralParser, parse_literal};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Why a file's data literal could not be extracted.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No `export default` / `export const` followed by `[` or `{`.
    #[error("no exported object or array literal found")]
    NoExport,

    /// More than one data export while strict mode is on.
    #[error("found {count} data exports, expected exactly one")]
    MultipleExports { count: usize },

    /// The literal text is not valid data-literal syntax.
    #[error(transparent)]
    Literal(#[from] LiteralError),

    /// The export is neither an object nor an array.
    #[error("exported value is {0}, expected an object or array")]
    UnexpectedShape(&'static str),
}

impl From<ExtractError> for CorpusError {
    fn from(err: ExtractError) -> Self {
        CorpusError::extract(err.to_string())
    }
}

/// Extraction settings.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Reject files with more than one data export.
    pub strict_exports: bool,
    /// Bare identifiers the literal parser may resolve.
    pub constants: Map<String, Value>,
}

impl From<&ExtractConfig> for ExtractOptions {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            strict_exports: config.strict_exports,
            constants: config.constants.clone(),
        }
    }
}

/// Where an export statement sits in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSite {
    /// `Some(name)` for `export const name = …`, `None` for `export default`.
    pub binding: Option<String>,
    /// Byte offset of the `export` keyword.
    pub statement_offset: usize,
    /// Byte offset of the literal's opening `[` or `{`.
    pub literal_offset: usize,
}

/// A data literal pulled out of a source file.
#[derive(Debug, Clone)]
pub struct ExtractedLiteral {
    pub value: Value,
    pub binding: Option<String>,
    /// Byte range of the literal text, delimiters included.
    pub span: Range<usize>,
    /// Further data exports in the file that were not read.
    pub ignored_exports: usize,
}

impl ExtractedLiteral {
    /// The captured literal text.
    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        &src[self.span.clone()]
    }

    /// Records in the literal: an array as-is, a single object as a
    /// one-element list.
    pub fn into_records(self) -> Result<Vec<Value>, ExtractError> {
        match self.value {
            Value::Array(items) => Ok(items),
            obj @ Value::Object(_) => Ok(vec![obj]),
            other => Err(ExtractError::UnexpectedShape(value_kind(&other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Export discovery
// ---------------------------------------------------------------------------

/// Matches `export default [`/`{` and `export const name[: Type] = [`/`{`.
///
/// Runs over bytes so it can scan the blanked copy from [`blank_masked`].
static EXPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bexport\s+(?:default\s*|const\s+([A-Za-z_$][\w$]*)\s*(?::[^=;]*)?=\s*)([\[{])",
    )
    .expect("export regex")
});

/// All data export sites outside strings and comments, in source order.
pub fn export_sites(src: &str) -> Vec<ExportSite> {
    let blanked = blank_masked(src);

    EXPORT_RE
        .captures_iter(&blanked)
        .filter_map(|caps| {
            let statement = caps.get(0)?;
            let delimiter = caps.get(2)?;
            let binding = caps
                .get(1)
                .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned());
            Some(ExportSite {
                binding,
                statement_offset: statement.start(),
                literal_offset: delimiter.start(),
            })
        })
        .collect()
}

/// The primary (first) data export, if any.
pub fn locate_export(src: &str) -> Option<ExportSite> {
    export_sites(src).into_iter().next()
}

/// Number of data exports in the file.
pub fn count_exports(src: &str) -> usize {
    export_sites(src).len()
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Locate the primary export and parse its literal.
pub fn extract_literal(src: &str, opts: &ExtractOptions) -> Result<ExtractedLiteral, ExtractError> {
    let sites = export_sites(src);
    let site = sites.first().ok_or(ExtractError::NoExport)?;

    if opts.strict_exports && sites.len() > 1 {
        return Err(ExtractError::MultipleExports { count: sites.len() });
    }

    let mut parser = LiteralParser::new(src, &opts.constants);
    let (value, end) = parser.parse_at(site.literal_offset)?;

    trace!(
        binding = ?site.binding,
        bytes = end - site.literal_offset,
        "data literal extracted"
    );

    Ok(ExtractedLiteral {
        value,
        binding: site.binding.clone(),
        span: site.literal_offset..end,
        ignored_exports: sites.len() - 1,
    })
}

/// Extract the file's records, normalizing a single object to a list.
pub fn extract_records(src: &str, opts: &ExtractOptions) -> Result<Vec<Value>, ExtractError> {
    extract_literal(src, opts)?.into_records()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// String/comment masking
// ---------------------------------------------------------------------------

/// Byte ranges covered by string literals and comments, sorted by start.
///
/// Delimiters are ASCII, so scanning bytes is safe for UTF-8 input.
fn masked_regions(src: &str) -> Vec<Range<usize>> {
    let bytes = src.as_bytes();
    let mut regions = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        i = match (bytes[i], bytes.get(i + 1)) {
            (b'/', Some(b'/')) => find_from(bytes, i + 2, b"\n").map_or(bytes.len(), |n| n + 1),
            (b'/', Some(b'*')) => find_from(bytes, i + 2, b"*/").map_or(bytes.len(), |n| n + 2),
            (b'\'' | b'"', _) => skip_quoted(bytes, i),
            (b'`', _) => skip_template(bytes, i),
            _ => {
                i += 1;
                continue;
            }
        };
        regions.push(start..i);
    }

    regions
}

/// A byte copy of `src` with every string and comment replaced by spaces.
///
/// Offsets line up with `src`, so a match in the copy is a match in the
/// source. Nothing inside a masked region can extend a match into live code.
fn blank_masked(src: &str) -> Vec<u8> {
    let mut bytes = src.as_bytes().to_vec();
    for region in masked_regions(src) {
        let end = region.end.min(bytes.len());
        bytes[region.start..end].fill(b' ');
    }
    bytes
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_template(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return i + 1,
            b'$' if bytes.get(i + 1) == Some(&b'{') => i = skip_braced(bytes, i + 2),
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Skip a `${ … }` body, honoring nested braces and strings.
fn skip_braced(bytes: &[u8], start: usize) -> usize {
    let mut depth = 1;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            b'\'' | b'"' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            b'`' => {
                i = skip_template(bytes, i);
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

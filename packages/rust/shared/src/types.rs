//! Core domain types: raw records as authored, normalized resources,
//! categories, and the artifact envelope.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fixed `meta.version` literal stamped on every artifact.
pub const ARTIFACT_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// ResourceType
// ---------------------------------------------------------------------------

/// Which collection a resource came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Configuration guides (e.g. `CLAUDE.md` files).
    Config,
    /// Prompt templates.
    Prompt,
    /// External tools and links.
    Tool,
}

impl ResourceType {
    /// The tag written to the `type` field of a resource.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Prompt => "prompt",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RawRecord
// ---------------------------------------------------------------------------

/// A content entry as authored in a source file, before normalization.
///
/// Only `id` is required. Any other known field holding a value of the wrong
/// type reads as absent, so one bad field never costs the whole record.
/// Unknown fields are kept in `extra` so a collection can promote an
/// alternate payload field (e.g. `prompt`) into `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub tagline: Option<String>,
    /// Human-readable category display name.
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub framework: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<RawAuthor>,
    #[serde(default, deserialize_with = "lenient")]
    pub stats: Option<RawStats>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_updated: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub featured: Option<bool>,
    /// Fields not covered above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawRecord {
    /// Look up a string field by its authored name.
    ///
    /// Known fields are resolved first, then `extra`.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        match name {
            "content" => self.content.as_deref(),
            "description" => Some(self.description.as_str()),
            "url" => self.url.as_deref(),
            _ => self.extra.get(name).and_then(Value::as_str),
        }
    }
}

/// Author as authored; either part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAuthor {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

/// Engagement counters as authored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStats {
    #[serde(default, deserialize_with = "lenient")]
    pub votes: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub copies: Option<u64>,
}

/// Deserialize a field, reading a value of the wrong type as its default.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Like [`lenient`], keeping only the string entries of a tag list.
fn lenient_tags<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(tag) => Some(tag),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    };
    Ok(tags)
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// The unified, normalized output schema shared by all collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    /// Never empty; falls back to `id`.
    pub slug: String,
    /// Never empty unless the description is.
    pub tagline: String,
    pub description: String,
    pub category_id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub tags: Vec<String>,
    pub author: Author,
    pub stats: Stats,
    pub difficulty: String,
    pub last_updated: String,
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

/// Fully-resolved author identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub url: String,
}

/// Fully-resolved engagement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub votes: u64,
    pub copies: u64,
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A category descriptor, passed through with its authored key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub Map<String, Value>);

impl Category {
    /// The category's stable identifier, if it has a string `id`.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// The `featured` flag; absent or non-boolean reads as `false`.
    pub fn featured(&self) -> bool {
        self.0.get("featured").and_then(Value::as_bool).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// The `{ data, meta }` wrapper applied to every output artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub meta: Meta,
}

/// Envelope metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Number of entries in `data`; omitted for the stats artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// RFC 3339 wall-clock time of the run.
    pub generated_at: String,
    pub version: String,
}

/// Corpus-wide counters written to `stats.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusStats {
    pub total_resources: usize,
    pub total_categories: usize,
    /// Placeholder taken from configuration.
    pub total_contributors: u64,
    /// Placeholder taken from configuration.
    pub total_copies: u64,
    /// Most recent `lastUpdated` across all resources.
    pub last_updated: String,
    pub resources_by_type: BTreeMap<String, usize>,
}

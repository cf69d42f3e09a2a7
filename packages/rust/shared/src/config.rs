//! Build configuration for corpusgen.
//!
//! An optional `corpusgen.toml` at the project root overrides the baked-in
//! defaults. A missing file means "use defaults"; a malformed one is fatal.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CorpusError, Result};
use crate::types::ResourceType;

/// Default configuration file name, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "corpusgen.toml";

// ---------------------------------------------------------------------------
// Config structs (matching corpusgen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level build config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Content collections, processed in this order.
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionConfig>,

    /// Which files in a collection directory count as sources.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Data-literal extraction settings.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Fallback values for fields a record leaves out.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Category display-name → id table.
    #[serde(default)]
    pub categories: CategoriesConfig,

    /// Placeholder counters for `stats.json`.
    #[serde(default)]
    pub stats: StatsConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            collections: default_collections(),
            sources: SourcesConfig::default(),
            extract: ExtractConfig::default(),
            defaults: DefaultsConfig::default(),
            categories: CategoriesConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

/// `[paths]` section. All paths are relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_categories_file")]
    pub categories_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            categories_file: default_categories_file(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public/data")
}
fn default_categories_file() -> PathBuf {
    PathBuf::from("content/categories.ts")
}

/// `[[collections]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection name used in logs.
    pub name: String,
    /// Source directory, relative to the project root.
    pub dir: PathBuf,
    /// Tag written to each resource's `type`.
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Field promoted into `content` when the record stores its body elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_field: Option<String>,
}

fn default_collections() -> Vec<CollectionConfig> {
    vec![
        CollectionConfig {
            name: "configs".into(),
            dir: PathBuf::from("content/configs"),
            resource_type: ResourceType::Config,
            content_field: None,
        },
        CollectionConfig {
            name: "prompts".into(),
            dir: PathBuf::from("content/prompts"),
            resource_type: ResourceType::Prompt,
            content_field: Some("prompt".into()),
        },
        CollectionConfig {
            name: "tools".into(),
            dir: PathBuf::from("content/tools"),
            resource_type: ResourceType::Tool,
            content_field: None,
        },
    ]
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// File name suffixes that mark a content module.
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<String>,

    /// Barrel files that only re-export others.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            suffixes: default_suffixes(),
            exclude: default_exclude(),
        }
    }
}

fn default_suffixes() -> Vec<String> {
    vec![".ts".into(), ".js".into()]
}
fn default_exclude() -> Vec<String> {
    vec!["index.ts".into(), "index.js".into()]
}

/// `[extract]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Reject files that export more than one data literal instead of
    /// taking the first.
    #[serde(default)]
    pub strict_exports: bool,

    /// Bare identifiers the literal parser may resolve.
    #[serde(default)]
    pub constants: Map<String, Value>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_author_name")]
    pub author_name: String,

    #[serde(default = "default_author_url")]
    pub author_url: String,

    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    #[serde(default = "default_last_updated")]
    pub last_updated: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            author_name: default_author_name(),
            author_url: default_author_url(),
            difficulty: default_difficulty(),
            last_updated: default_last_updated(),
        }
    }
}

fn default_author_name() -> String {
    "Community".into()
}
fn default_author_url() -> String {
    "https://github.com".into()
}
fn default_difficulty() -> String {
    "intermediate".into()
}
fn default_last_updated() -> String {
    "2024-01-01".into()
}

/// `[categories]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesConfig {
    /// Id assigned when a display name is not in `map`.
    #[serde(default = "default_category_id")]
    pub default_id: String,

    /// Ordered display-name → id pairs.
    #[serde(default = "default_category_map")]
    pub map: Vec<CategoryMapping>,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            default_id: default_category_id(),
            map: default_category_map(),
        }
    }
}

/// `[[categories.map]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    /// Display name as authored in content files.
    pub name: String,
    /// Stable identifier written to `categoryId`.
    pub id: String,
}

fn default_category_id() -> String {
    "claude-md".into()
}

fn default_category_map() -> Vec<CategoryMapping> {
    [
        ("Claude.md Configurations", "claude-md"),
        ("Prompt Templates", "prompts"),
        ("Tools & Utilities", "tools"),
        ("MCP Servers", "mcp-servers"),
        ("Agents", "agents"),
        ("Commands", "commands"),
        ("Hooks", "hooks"),
        ("Rules", "rules"),
    ]
    .into_iter()
    .map(|(name, id)| CategoryMapping {
        name: name.into(),
        id: id.into(),
    })
    .collect()
}

/// `[stats]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_contributors")]
    pub contributors: u64,

    #[serde(default = "default_copies")]
    pub copies: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            contributors: default_contributors(),
            copies: default_copies(),
        }
    }
}

fn default_contributors() -> u64 {
    50
}
fn default_copies() -> u64 {
    10_000
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl BuildConfig {
    /// Reject configs the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.collections.is_empty() {
            return Err(CorpusError::config("at least one [[collections]] entry is required"));
        }

        let mut names = HashSet::new();
        for collection in &self.collections {
            if !names.insert(collection.name.as_str()) {
                return Err(CorpusError::config(format!(
                    "duplicate collection name '{}'",
                    collection.name
                )));
            }
        }

        if self.sources.suffixes.is_empty() {
            return Err(CorpusError::config("[sources] suffixes must not be empty"));
        }

        if self.categories.default_id.trim().is_empty() {
            return Err(CorpusError::config("[categories] default_id must not be empty"));
        }

        if let Some(entry) = self.categories.map.iter().find(|m| m.id.trim().is_empty()) {
            return Err(CorpusError::config(format!(
                "category '{}' maps to an empty id",
                entry.name
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path of the config file for a project root.
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the build config for a project root. Returns defaults if the file does not exist.
pub fn load_config(root: &Path) -> Result<BuildConfig> {
    let path = config_file_path(root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(BuildConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the build config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<BuildConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;

    let config: BuildConfig = toml::from_str(&content).map_err(|e| {
        CorpusError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    config.validate()?;
    tracing::debug!(?path, collections = config.collections.len(), "config loaded");

    Ok(config)
}

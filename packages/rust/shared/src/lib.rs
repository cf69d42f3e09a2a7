//! Shared types, error model, and configuration for corpusgen.
//!
//! This crate is the foundation depended on by all other corpusgen crates.
//! It provides:
//! - [`CorpusError`], the unified error type
//! - Domain types ([`RawRecord`], [`Resource`], [`Category`], [`Envelope`])
//! - Configuration ([`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    BuildConfig, CONFIG_FILE_NAME, CategoriesConfig, CategoryMapping, CollectionConfig,
    DefaultsConfig, ExtractConfig, PathsConfig, SourcesConfig, StatsConfig, config_file_path,
    load_config, load_config_from,
};
pub use error::{CorpusError, Result};
pub use types::{
    ARTIFACT_VERSION, Author, Category, CorpusStats, Envelope, Meta, RawAuthor, RawRecord,
    RawStats, Resource, ResourceType, Stats,
};

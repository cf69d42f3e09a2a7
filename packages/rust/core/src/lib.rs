//! Build orchestration and domain logic for corpusgen.
//!
//! This crate ties together source reading, literal extraction, record
//! normalization and artifact writing into one end-to-end build
//! ([`pipeline::run_build`]).

pub mod categories;
pub mod category_map;
pub mod normalize;
pub mod pipeline;
pub mod reader;

pub use categories::{load_categories, transform_categories};
pub use category_map::CategoryMap;
pub use normalize::{NormalizeRules, derive_tagline, normalize_record};
pub use pipeline::{
    BuildResult, CollectionSummary, Corpus, ProgressReporter, RunOptions, SilentProgress,
    SkippedFile, build_corpus, run_build,
};
pub use reader::{SourceFile, SourceFilter, read_source_file, read_sources};

//! Artifact writer: aggregate stats and the three JSON envelopes.
//!
//! Output layout:
//! ```text
//! <out_dir>/
//! ├── resources.json
//! ├── categories.json
//! └── stats.json
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use corpusgen_shared::{
    ARTIFACT_VERSION, Category, CorpusError, CorpusStats, Envelope, Meta, Resource, Result,
};

pub const RESOURCES_FILE: &str = "resources.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const STATS_FILE: &str = "stats.json";

/// Inputs to the writer that are not part of the corpus itself.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Placeholder contributor count for `stats.json`.
    pub contributors: u64,
    /// Placeholder copy count for `stats.json`.
    pub copies: u64,
    /// `lastUpdated` used when there are no resources.
    pub fallback_last_updated: String,
    /// Wall-clock time of the run, stamped into every `meta`.
    pub generated_at: DateTime<Utc>,
}

/// Paths of the files written by [`write_artifacts`].
#[derive(Debug, Clone)]
pub struct WrittenArtifacts {
    pub out_dir: PathBuf,
    pub resources: PathBuf,
    pub categories: PathBuf,
    pub stats: PathBuf,
    pub corpus_stats: CorpusStats,
}

/// Compute corpus-wide counters.
///
/// `lastUpdated` is the greatest resource `lastUpdated` (ISO dates compare
/// lexically), so the payload depends only on the input corpus.
pub fn compute_stats(
    resources: &[Resource],
    categories: &[Category],
    opts: &WriteOptions,
) -> CorpusStats {
    let mut by_type = BTreeMap::new();
    for resource in resources {
        *by_type
            .entry(resource.resource_type.as_str().to_string())
            .or_insert(0) += 1;
    }

    let last_updated = resources
        .iter()
        .map(|r| r.last_updated.as_str())
        .max()
        .unwrap_or(opts.fallback_last_updated.as_str())
        .to_string();

    CorpusStats {
        total_resources: resources.len(),
        total_categories: categories.len(),
        total_contributors: opts.contributors,
        total_copies: opts.copies,
        last_updated,
        resources_by_type: by_type,
    }
}

/// Wrap a payload in the `{ data, meta }` envelope.
pub fn envelope<T>(data: T, total: Option<usize>, generated_at: &DateTime<Utc>) -> Envelope<T> {
    Envelope {
        data,
        meta: Meta {
            total,
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            version: ARTIFACT_VERSION.to_string(),
        },
    }
}

/// Write `resources.json`, `categories.json` and `stats.json` to `out_dir`.
///
/// The directory is created if missing. Each file is written to a hidden
/// temp sibling and renamed into place.
#[instrument(skip_all, fields(out_dir = %out_dir.display(), resources = resources.len(), categories = categories.len()))]
pub fn write_artifacts(
    out_dir: &Path,
    resources: &[Resource],
    categories: &[Category],
    opts: &WriteOptions,
) -> Result<WrittenArtifacts> {
    std::fs::create_dir_all(out_dir).map_err(|e| CorpusError::io(out_dir, e))?;

    let corpus_stats = compute_stats(resources, categories, opts);
    let generated_at = &opts.generated_at;

    let resources_path = out_dir.join(RESOURCES_FILE);
    write_json(
        &resources_path,
        &envelope(resources, Some(resources.len()), generated_at),
    )?;

    let categories_path = out_dir.join(CATEGORIES_FILE);
    write_json(
        &categories_path,
        &envelope(categories, Some(categories.len()), generated_at),
    )?;

    let stats_path = out_dir.join(STATS_FILE);
    write_json(
        &stats_path,
        &envelope(std::slice::from_ref(&corpus_stats), None, generated_at),
    )?;

    info!(
        resources = corpus_stats.total_resources,
        categories = corpus_stats.total_categories,
        "artifacts written"
    );

    Ok(WrittenArtifacts {
        out_dir: out_dir.to_path_buf(),
        resources: resources_path,
        categories: categories_path,
        stats: stats_path,
        corpus_stats,
    })
}

/// Write a JSON file (pretty-printed) via temp file + rename.
fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| CorpusError::Serialize(format!("{}: {e}", path.display())))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &json).map_err(|e| CorpusError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| CorpusError::io(path, e))?;

    debug!(path = %path.display(), size = json.len(), "wrote JSON file");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

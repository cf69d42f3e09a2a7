//! End-to-end build: collections → records → resources → artifacts.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use corpusgen_artifacts::{WriteOptions, WrittenArtifacts, write_artifacts};
use corpusgen_extract::{ExtractOptions, extract_literal};
use corpusgen_shared::{
    BuildConfig, Category, CollectionConfig, CorpusError, RawRecord, Resource, ResourceType,
    Result,
};

use crate::categories::load_categories;
use crate::normalize::{NormalizeRules, normalize_record};
use crate::reader::{SourceFile, SourceFilter, read_sources};

/// Everything the build produced before writing.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub resources: Vec<Resource>,
    pub categories: Vec<Category>,
    pub collections: Vec<CollectionSummary>,
    pub skipped: Vec<SkippedFile>,
}

impl Corpus {
    pub fn count_of(&self, resource_type: ResourceType) -> usize {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .count()
    }
}

/// Per-collection counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub name: String,
    pub resource_type: ResourceType,
    pub files: usize,
    pub resources: usize,
    pub skipped: usize,
}

/// A source file whose records were left out of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub collection: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Caller-supplied knobs for [`run_build`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Output directory; defaults to `paths.output_dir` under the root.
    pub out_dir: Option<PathBuf>,
    /// Build the corpus but write nothing.
    pub dry_run: bool,
}

/// Result of [`run_build`].
#[derive(Debug)]
pub struct BuildResult {
    pub corpus: Corpus,
    pub out_dir: PathBuf,
    /// `None` on a dry run.
    pub written: Option<WrittenArtifacts>,
    pub elapsed: Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each source file is processed.
    fn file_done(&self, collection: &str, file: &str, current: usize, total: usize);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_done(&self, _collection: &str, _file: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Read, extract and normalize every collection, then load the categories.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn build_corpus(
    config: &BuildConfig,
    root: &Path,
    progress: &dyn ProgressReporter,
) -> Result<Corpus> {
    let filter = SourceFilter::from(&config.sources);
    let extract_opts = ExtractOptions::from(&config.extract);
    let rules = NormalizeRules::from_config(config);

    let mut corpus = Corpus::default();

    for collection in &config.collections {
        progress.phase(&format!("Reading {}", collection.name));
        let loaded = load_collection(collection, root, &filter, &extract_opts, &rules, progress)?;

        warn_duplicate_ids(&collection.name, &loaded.resources);

        corpus.collections.push(CollectionSummary {
            name: collection.name.clone(),
            resource_type: collection.resource_type,
            files: loaded.files,
            resources: loaded.resources.len(),
            skipped: loaded.skipped.len(),
        });
        corpus.resources.extend(loaded.resources);
        corpus.skipped.extend(loaded.skipped);
    }

    progress.phase("Loading categories");
    corpus.categories = load_categories(&root.join(&config.paths.categories_file), &extract_opts)?;

    warn_dangling_categories(&corpus.resources, &corpus.categories);

    info!(
        resources = corpus.resources.len(),
        categories = corpus.categories.len(),
        skipped = corpus.skipped.len(),
        "corpus built"
    );

    Ok(corpus)
}

/// Build the corpus and write the three artifacts.
#[instrument(skip_all, fields(root = %root.display(), dry_run = opts.dry_run))]
pub fn run_build(
    config: &BuildConfig,
    root: &Path,
    opts: &RunOptions,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    let generated_at = chrono::Utc::now();

    let corpus = build_corpus(config, root, progress)?;

    let out_dir = opts
        .out_dir
        .clone()
        .unwrap_or_else(|| root.join(&config.paths.output_dir));

    let written = if opts.dry_run {
        info!(out_dir = %out_dir.display(), "dry run, nothing written");
        None
    } else {
        progress.phase("Writing artifacts");
        let write_opts = WriteOptions {
            contributors: config.stats.contributors,
            copies: config.stats.copies,
            fallback_last_updated: config.defaults.last_updated.clone(),
            generated_at,
        };
        Some(write_artifacts(
            &out_dir,
            &corpus.resources,
            &corpus.categories,
            &write_opts,
        )?)
    };

    let result = BuildResult {
        corpus,
        out_dir,
        written,
        elapsed: start.elapsed(),
    };
    progress.done(&result);

    Ok(result)
}

/// Records of one collection plus what was left out.
#[derive(Debug, Default)]
pub struct LoadedCollection {
    pub files: usize,
    pub resources: Vec<Resource>,
    pub skipped: Vec<SkippedFile>,
}

/// Read and normalize one collection directory.
///
/// Recoverable per-file errors are logged and recorded in `skipped`; a
/// directory that cannot be read fails the whole build.
#[instrument(skip_all, fields(collection = %collection.name))]
pub fn load_collection(
    collection: &CollectionConfig,
    root: &Path,
    filter: &SourceFilter,
    extract_opts: &ExtractOptions,
    rules: &NormalizeRules,
    progress: &dyn ProgressReporter,
) -> Result<LoadedCollection> {
    let sources = read_sources(&root.join(&collection.dir), filter)?;
    let total = sources.len();

    let mut loaded = LoadedCollection {
        files: total,
        ..Default::default()
    };

    for (i, source) in sources.iter().enumerate() {
        match records_from_source(source, extract_opts) {
            Ok(records) => {
                debug!(file = %source.name, records = records.len(), "records extracted");
                for raw in records {
                    let content = collection
                        .content_field
                        .as_deref()
                        .and_then(|field| raw.field_str(field))
                        .map(str::to_owned);
                    loaded.resources.push(normalize_record(
                        raw,
                        collection.resource_type,
                        content,
                        rules,
                    ));
                }
            }
            Err(e) if e.is_recoverable() => {
                warn!(file = %source.name, error = %e, "skipping file");
                loaded.skipped.push(SkippedFile {
                    collection: collection.name.clone(),
                    path: source.path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
        progress.file_done(&collection.name, &source.name, i + 1, total);
    }

    Ok(loaded)
}

/// Extract a file's literal and shape it into raw records.
pub fn records_from_source(source: &SourceFile, opts: &ExtractOptions) -> Result<Vec<RawRecord>> {
    let literal = extract_literal(&source.text, opts)?;
    if literal.ignored_exports > 0 {
        warn!(
            file = %source.name,
            ignored = literal.ignored_exports,
            "multiple data exports, using the first"
        );
    }

    literal
        .into_records()?
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<RawRecord>(value)
                .map_err(|e| CorpusError::parse(format!("record {index}: {e}")))
        })
        .collect()
}

fn warn_duplicate_ids(collection: &str, resources: &[Resource]) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for resource in resources {
        *seen.entry(resource.id.as_str()).or_insert(0) += 1;
    }

    let duplicates: BTreeMap<_, _> = seen.into_iter().filter(|(_, n)| *n > 1).collect();
    for (id, count) in duplicates {
        warn!(collection, id, count, "duplicate resource id");
    }
}

fn warn_dangling_categories(resources: &[Resource], categories: &[Category]) {
    let known: HashSet<&str> = categories.iter().filter_map(Category::id).collect();

    let mut dangling: BTreeMap<&str, usize> = BTreeMap::new();
    for resource in resources {
        if !known.contains(resource.category_id.as_str()) {
            *dangling.entry(resource.category_id.as_str()).or_insert(0) += 1;
        }
    }

    for (category_id, count) in dangling {
        warn!(category_id, count, "resources reference an unknown category");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn fixture_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
    }

    /// A root with the three default collection dirs and a categories file.
    fn scratch_root() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for dir in ["content/configs", "content/prompts", "content/tools"] {
            std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        std::fs::write(
            tmp.path().join("content/categories.ts"),
            "export const categories = [{ id: 'claude-md', name: 'Claude.md Configurations' }];",
        )
        .unwrap();
        tmp
    }

    fn write(root: &Path, rel: &str, text: &str) {
        std::fs::write(root.join(rel), text).unwrap();
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn build(root: &Path) -> Corpus {
        build_corpus(&BuildConfig::default(), root, &SilentProgress).unwrap()
    }

    #[test]
    fn end_to_end_single_config() {
        let tmp = scratch_root();
        write(
            tmp.path(),
            "content/configs/a.ts",
            r#"export default [{id:"a", title:"A", description:"Does X. More.", category:"Claude.md Configurations", content:"..."}];"#,
        );

        let out = tmp.path().join("out");
        let result = run_build(
            &BuildConfig::default(),
            tmp.path(),
            &RunOptions {
                out_dir: Some(out.clone()),
                dry_run: false,
            },
            &SilentProgress,
        )
        .unwrap();
        assert!(result.written.is_some());

        let resources = read_json(&out.join("resources.json"));
        let a = &resources["data"][0];
        assert_eq!(a["id"], "a");
        assert_eq!(a["slug"], "a");
        assert_eq!(a["tagline"], "Does X.");
        assert_eq!(a["categoryId"], "claude-md");
        assert_eq!(a["tags"], serde_json::json!([]));
        assert_eq!(a["stats"], serde_json::json!({ "votes": 0, "copies": 0 }));
        assert_eq!(a["difficulty"], "intermediate");
        assert_eq!(a["type"], "config");
        assert_eq!(a["content"], "...");
    }

    #[test]
    fn broken_file_is_skipped_and_others_kept() {
        let tmp = scratch_root();
        write(tmp.path(), "content/configs/a.ts", "export default { id: 'a', title: 'A', description: 'd' };");
        write(tmp.path(), "content/configs/b.ts", "export default [ makeConfig('b') ];");
        write(tmp.path(), "content/configs/c.ts", "export const c = [{ id: 'c', title: 'C', description: 'd' }];");

        let corpus = build(tmp.path());
        let ids: Vec<_> = corpus.resources.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(corpus.skipped.len(), 1);
        assert!(corpus.skipped[0].path.ends_with("b.ts"));
        assert_eq!(corpus.collections[0].files, 3);
        assert_eq!(corpus.collections[0].skipped, 1);
    }

    #[test]
    fn record_without_id_skips_its_file() {
        let tmp = scratch_root();
        write(tmp.path(), "content/tools/t.ts", "export default [{ title: 'No id' }];");

        let corpus = build(tmp.path());
        assert!(corpus.resources.is_empty());
        assert!(corpus.skipped[0].reason.contains("record 0"));
    }

    #[test]
    fn mistyped_field_keeps_sibling_records() {
        let tmp = scratch_root();
        write(
            tmp.path(),
            "content/configs/mixed.ts",
            "export default [\n  { id: 'a', title: 'A', description: 'd', featured: 'yes', stats: { votes: 1.5 } },\n  { id: 'b', title: 'B', description: 'd', tags: ['x', 3] },\n];",
        );

        let corpus = build(tmp.path());
        assert!(corpus.skipped.is_empty());
        assert_eq!(corpus.resources.len(), 2);
        assert!(!corpus.resources[0].featured);
        assert_eq!(corpus.resources[0].stats.votes, 0);
        assert_eq!(corpus.resources[1].tags, vec!["x"]);
    }

    #[test]
    fn single_object_and_one_element_array_match() {
        let record = "{ id: 'x', title: 'X', description: 'Same. Thing.', tags: ['t'] }";

        let single = scratch_root();
        write(single.path(), "content/configs/x.ts", &format!("export default {record};"));
        let array = scratch_root();
        write(array.path(), "content/configs/x.ts", &format!("export default [{record}];"));

        assert_eq!(build(single.path()).resources, build(array.path()).resources);
    }

    #[test]
    fn missing_collection_dir_is_fatal() {
        let tmp = scratch_root();
        std::fs::remove_dir(tmp.path().join("content/tools")).unwrap();

        let err = build_corpus(&BuildConfig::default(), tmp.path(), &SilentProgress).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }

    #[test]
    fn strict_exports_rejects_multi_export_files() {
        let tmp = scratch_root();
        write(
            tmp.path(),
            "content/configs/two.ts",
            "export const a = { id: 'a', title: 'A', description: 'd' };\nexport const b = { id: 'b', title: 'B', description: 'd' };",
        );

        let lenient = build(tmp.path());
        assert_eq!(lenient.resources.len(), 1);
        assert_eq!(lenient.resources[0].id, "a");

        let mut config = BuildConfig::default();
        config.extract.strict_exports = true;
        let strict = build_corpus(&config, tmp.path(), &SilentProgress).unwrap();
        assert!(strict.resources.is_empty());
        assert_eq!(strict.skipped.len(), 1);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = scratch_root();
        let out = tmp.path().join("out");
        let result = run_build(
            &BuildConfig::default(),
            tmp.path(),
            &RunOptions {
                out_dir: Some(out.clone()),
                dry_run: true,
            },
            &SilentProgress,
        )
        .unwrap();
        assert!(result.written.is_none());
        assert!(!out.exists());
    }

    #[test]
    fn fixture_corpus_builds() {
        let corpus = build(&fixture_root());

        assert_eq!(corpus.count_of(ResourceType::Config), 3);
        assert_eq!(corpus.count_of(ResourceType::Prompt), 2);
        assert_eq!(corpus.count_of(ResourceType::Tool), 2);
        assert_eq!(corpus.categories.len(), 4);
        assert_eq!(corpus.skipped.len(), 1);
        assert!(corpus.skipped[0].path.ends_with("broken.ts"));

        // Collections come out in configured order, files sorted within.
        let ids: Vec<_> = corpus.resources.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "nextjs-app-router",
                "rust-cli",
                "react-components",
                "code-review",
                "write-tests",
                "ripgrep",
                "context7",
            ]
        );

        let review = corpus.resources.iter().find(|r| r.id == "code-review").unwrap();
        assert_eq!(review.category_id, "prompts");
        assert!(review.content.as_deref().unwrap().starts_with("Review the following"));

        let rg = corpus.resources.iter().find(|r| r.id == "ripgrep").unwrap();
        assert_eq!(rg.url.as_deref(), Some("https://github.com/BurntSushi/ripgrep"));
        assert_eq!(rg.content, None);
    }

    #[test]
    fn fixture_build_is_idempotent_and_counts_agree() {
        let tmp = tempfile::tempdir().unwrap();
        let opts = RunOptions {
            out_dir: Some(tmp.path().to_path_buf()),
            dry_run: false,
        };

        let files = ["resources.json", "categories.json", "stats.json"];
        let data_text = || {
            files.map(|f| {
                let text = std::fs::read_to_string(tmp.path().join(f)).unwrap();
                let envelope: Value = serde_json::from_str(&text).unwrap();
                serde_json::to_string_pretty(&envelope["data"]).unwrap()
            })
        };

        run_build(&BuildConfig::default(), &fixture_root(), &opts, &SilentProgress).unwrap();
        let first = data_text();
        run_build(&BuildConfig::default(), &fixture_root(), &opts, &SilentProgress).unwrap();
        let second = data_text();
        for (name, (a, b)) in files.iter().zip(first.iter().zip(&second)) {
            assert_eq!(a, b, "{name} data changed between runs");
        }

        let data = |f: &str| read_json(&tmp.path().join(f))["data"].clone();
        let stats_data = data("stats.json");
        let stats = &stats_data[0];
        assert_eq!(stats["totalResources"], data("resources.json").as_array().unwrap().len());
        assert_eq!(stats["totalCategories"], data("categories.json").as_array().unwrap().len());
        assert_eq!(stats["resourcesByType"]["prompt"], 2);
    }
}

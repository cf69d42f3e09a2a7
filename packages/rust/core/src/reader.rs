//! Module source reader: raw text of every content file in a directory.
//!
//! Pure I/O. A missing directory or an unreadable file is fatal; deciding
//! whether a file's content is usable happens one layer up.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use corpusgen_shared::{CorpusError, Result, SourcesConfig};

/// One content module as read from disk.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name without directory, used in log lines.
    pub name: String,
    pub path: PathBuf,
    pub text: String,
}

/// Which directory entries count as content modules.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    pub suffixes: Vec<String>,
    /// Barrel files that only re-export others.
    pub exclude: Vec<String>,
}

impl From<&SourcesConfig> for SourceFilter {
    fn from(config: &SourcesConfig) -> Self {
        Self {
            suffixes: config.suffixes.clone(),
            exclude: config.exclude.clone(),
        }
    }
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::from(&SourcesConfig::default())
    }
}

impl SourceFilter {
    pub fn accepts(&self, file_name: &str) -> bool {
        self.suffixes.iter().any(|s| file_name.ends_with(s.as_str()))
            && !self.exclude.iter().any(|e| e == file_name)
    }
}

/// Read every matching file in `dir`, sorted by file name.
///
/// Sub-directories are not descended into.
#[instrument(skip(filter), fields(dir = %dir.display()))]
pub fn read_sources(dir: &Path, filter: &SourceFilter) -> Result<Vec<SourceFile>> {
    let entries = std::fs::read_dir(dir).map_err(|e| CorpusError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CorpusError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            debug!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };

        if filter.accepts(&name) {
            paths.push(path);
        }
    }

    paths.sort();

    let files = paths
        .iter()
        .map(|p| read_source_file(p))
        .collect::<Result<Vec<_>>>()?;

    debug!(count = files.len(), "source files read");
    Ok(files)
}

/// Read a single source file.
pub fn read_source_file(path: &Path) -> Result<SourceFile> {
    let text = std::fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SourceFile {
        name,
        path: path.to_path_buf(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_suffix_and_skips_barrels() {
        let filter = SourceFilter::default();
        assert!(filter.accepts("react.ts"));
        assert!(filter.accepts("legacy.js"));
        assert!(!filter.accepts("index.ts"));
        assert!(!filter.accepts("README.md"));
        assert!(!filter.accepts("types.d.tsx"));
    }

    #[test]
    fn reads_matching_files_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("zeta.ts"), "export default {}").unwrap();
        std::fs::write(tmp.path().join("alpha.ts"), "export default []").unwrap();
        std::fs::write(tmp.path().join("index.ts"), "export * from './alpha';").unwrap();
        std::fs::write(tmp.path().join("notes.md"), "# notes").unwrap();
        std::fs::create_dir(tmp.path().join("nested.ts")).unwrap();

        let files = read_sources(tmp.path(), &SourceFilter::default()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["alpha.ts", "zeta.ts"]);
        assert_eq!(files[0].text, "export default []");
    }

    #[test]
    fn missing_directory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_sources(&tmp.path().join("absent"), &SourceFilter::default()).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn missing_single_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_source_file(&tmp.path().join("categories.ts")).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}

//! CLI definition, tracing setup, and the build command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use corpusgen_core::pipeline::{BuildResult, ProgressReporter, RunOptions, run_build};
use corpusgen_shared::{BuildConfig, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// corpusgen: compile content modules into static JSON artifacts.
#[derive(Parser, Debug)]
#[command(
    name = "corpusgen",
    version,
    about = "Compile hand-authored content modules into static JSON artifacts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Project root; content and output paths resolve against it.
    #[arg(long, env = "CORPUSGEN_ROOT")]
    pub root: Option<PathBuf>,

    /// Config file (defaults to corpusgen.toml under the root, if present).
    #[arg(long, env = "CORPUSGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output directory (overrides paths.output_dir).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Build and report without writing artifacts.
    #[arg(long)]
    pub dry_run: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber. Logs go to stderr so stdout carries
/// only the summary line.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "corpusgen=info",
        1 => "corpusgen=debug",
        _ => "corpusgen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Run the build.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().wrap_err("cannot determine working directory")?,
    };
    if !root.is_dir() {
        return Err(eyre!("project root '{}' is not a directory", root.display()));
    }

    let config = resolve_config(&root, cli.config.as_deref())?;

    info!(
        root = %root.display(),
        collections = config.collections.len(),
        dry_run = cli.dry_run,
        "starting build"
    );

    let opts = RunOptions {
        out_dir: cli.out.clone(),
        dry_run: cli.dry_run,
    };

    let reporter = CliProgress::new(cli.log_format == LogFormat::Text);
    let result = run_build(&config, &root, &opts, &reporter)?;

    println!("{}", summary_line(&result, cli.dry_run));
    Ok(())
}

fn resolve_config(root: &Path, explicit: Option<&Path>) -> Result<BuildConfig> {
    let config = match explicit {
        Some(path) => load_config_from(path)?,
        None => load_config(root)?,
    };
    Ok(config)
}

/// One-line outcome: counts per type, categories, output location.
fn summary_line(result: &BuildResult, dry_run: bool) -> String {
    let corpus = &result.corpus;

    let per_type = corpus
        .collections
        .iter()
        .map(|c| format!("{} {}", c.resources, c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let skipped = match corpus.skipped.len() {
        0 => String::new(),
        1 => ", 1 file skipped".to_string(),
        n => format!(", {n} files skipped"),
    };

    let verb = if dry_run { "would write" } else { "wrote" };

    format!(
        "corpusgen: {} resources ({per_type}) and {} categories, {verb} {}{skipped} in {:.1}s",
        corpus.resources.len(),
        corpus.categories.len(),
        result.out_dir.display(),
        result.elapsed.as_secs_f64(),
    )
}

// ---------------------------------------------------------------------------
// Progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(visible: bool) -> Self {
        if !visible {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_done(&self, collection: &str, file: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("{collection} [{current}/{total}] {file}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

/// A build that fails returns before `done`; the spinner must not be left ticking.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpusgen_core::pipeline::{CollectionSummary, Corpus, SkippedFile};
    use corpusgen_shared::ResourceType;

    #[test]
    fn no_arguments_builds_from_cwd() {
        let cli = Cli::try_parse_from(["corpusgen"]).unwrap();
        assert!(cli.root.is_none());
        assert!(cli.out.is_none());
        assert!(!cli.dry_run);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "corpusgen",
            "--root",
            "site",
            "--config",
            "site/corpusgen.toml",
            "--out",
            "dist/data",
            "--dry-run",
            "--log-format",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, Some(PathBuf::from("site/corpusgen.toml")));
        assert_eq!(cli.out, Some(PathBuf::from("dist/data")));
        assert!(cli.dry_run);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn spinner_is_cleared_when_build_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let reporter = CliProgress::new(false);
        let spinner = reporter.spinner.clone();

        let outcome = run_build(
            &BuildConfig::default(),
            tmp.path(),
            &RunOptions::default(),
            &reporter,
        );
        assert!(outcome.is_err());
        assert!(!spinner.is_finished());

        drop(reporter);
        assert!(spinner.is_finished());
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["corpusgen", "--log-format", "yaml"]).is_err());
    }

    #[test]
    fn summary_reports_counts_and_skips() {
        let result = BuildResult {
            corpus: Corpus {
                resources: Vec::new(),
                categories: Vec::new(),
                collections: vec![CollectionSummary {
                    name: "configs".into(),
                    resource_type: ResourceType::Config,
                    files: 2,
                    resources: 0,
                    skipped: 1,
                }],
                skipped: vec![SkippedFile {
                    collection: "configs".into(),
                    path: PathBuf::from("content/configs/broken.ts"),
                    reason: "no exported object or array literal found".into(),
                }],
            },
            out_dir: PathBuf::from("public/data"),
            written: None,
            elapsed: Duration::from_millis(120),
        };

        let line = summary_line(&result, true);
        assert_eq!(
            line,
            "corpusgen: 0 resources (0 configs) and 0 categories, would write public/data, 1 file skipped in 0.1s"
        );
    }
}

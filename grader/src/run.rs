//! One grading run: intake, lookup wiring, evaluation and report output.

use crate::intake::{collect_submissions, load_assignment};
use anyhow::{Context, Result};
use integrity::report::IntegrityReport;
use integrity::{EvaluationSettings, Evaluator, NoSources, SourceLookup};
use serde::Serialize;
use source_check::{AcademicSearch, LocalCorpus, MatchPolicy, WebSearch};
use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use util::config::AppConfig;
use util::http::build_client;

/// Everything a run needs besides configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub input: PathBuf,
    /// Overrides `PLAGIARISM_THRESHOLD`.
    pub threshold: Option<f64>,
    /// Grade only these submissions, still comparing against all of them.
    pub only: Vec<String>,
    /// Reference corpus used in place of the academic endpoint.
    pub corpus_dir: Option<PathBuf>,
    /// Disables web and academic network lookups.
    pub offline: bool,
}

/// Builds the web and academic lookups for a run.
pub fn build_lookups(
    config: &AppConfig,
    options: &RunOptions,
) -> Result<(Arc<dyn SourceLookup>, Arc<dyn SourceLookup>)> {
    let web: Arc<dyn SourceLookup> = if options.offline {
        Arc::new(NoSources)
    } else {
        Arc::new(WebSearch::from_config(config)?)
    };

    let academic: Arc<dyn SourceLookup> = match (&options.corpus_dir, options.offline) {
        (Some(dir), _) => {
            let corpus = LocalCorpus::from_dir(dir, MatchPolicy::from_config(config))?;
            info!("Using local corpus of {} document(s)", corpus.len());
            Arc::new(corpus)
        }
        (None, true) => Arc::new(NoSources),
        (None, false) => Arc::new(
            AcademicSearch::from_config(config).context("building academic search client")?,
        ),
    };

    info!("Lookups: web={}, academic={}", web.name(), academic.name());
    Ok((web, academic))
}

/// Runs the integrity pass described by `options`.
pub async fn run(config: &AppConfig, options: &RunOptions) -> Result<IntegrityReport> {
    let assignment = load_assignment(&options.input)?;
    let base_dir = options
        .input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let client = build_client(config.download_timeout_secs).context("building HTTP client")?;
    let submissions = collect_submissions(&assignment, &base_dir, &client).await;

    let mut settings = EvaluationSettings::from_config(config);
    if let Some(threshold) = options.threshold {
        settings = settings.with_threshold(threshold);
    }
    let threshold = settings.threshold;

    let (web, academic) = build_lookups(config, options)?;
    let evaluator = Evaluator::new(web, academic, settings);

    let outcomes = if options.only.is_empty() {
        evaluator.evaluate(&submissions).await?
    } else {
        evaluator.evaluate_selected(&submissions, &options.only).await?
    };

    let report = IntegrityReport::new(assignment.assignment_id, threshold, outcomes);
    info!(
        "Assignment {}: {} of {} outcome(s) flagged",
        report.assignment_id,
        report.flagged,
        report.outcomes.len()
    );
    Ok(report)
}

/// Writes `value` as pretty JSON to `path`, creating parent directories.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).with_context(|| format!("creating dir {}", parent.display()))?;
        }
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, value).context("writing JSON")
}

use anyhow::{Context, Result};
use clap::Parser;
use grader::{RunOptions, run, save_json};
use integrity::report::IntegrityReportResponse;
use std::path::PathBuf;
use tracing_appender::rolling;
use util::config::AppConfig;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Assignment JSON describing the submissions to grade
    #[arg(long)]
    input: PathBuf,
    /// Output JSON path for the report
    #[arg(long, default_value = "integrity_report.json")]
    out: PathBuf,
    /// Plagiarism percentage above which grades are zeroed (overrides PLAGIARISM_THRESHOLD)
    #[arg(long)]
    threshold: Option<f64>,
    /// Grade only these submission ids (repeatable); all submissions are still compared
    #[arg(long = "only", num_args = 1..)]
    only: Vec<String>,
    /// Directory of .txt/.md reference documents used as the academic source
    #[arg(long)]
    corpus_dir: Option<PathBuf>,
    /// Skip network lookups
    #[arg(long)]
    offline: bool,
    /// Load environment variables from this file before reading configuration
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.env_file {
        dotenvy::from_path(path).with_context(|| format!("loading {}", path.display()))?;
    }
    let config = AppConfig::global();
    let _log_guard = init_logging(&config);

    let options = RunOptions {
        input: args.input,
        threshold: args.threshold,
        only: args.only,
        corpus_dir: args.corpus_dir,
        offline: args.offline,
    };
    let report = run(&config, &options).await?;
    let response = IntegrityReportResponse::from(report);

    println!("{}", serde_json::to_string_pretty(&response)?);
    save_json(&response, &args.out)?;

    eprintln!("Saved report to {}", args.out.display());
    Ok(())
}

fn init_logging(config: &AppConfig) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", &config.log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true);

    let env_filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("grader=info,integrity=info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config.log_to_stderr {
        registry.with(stderr_layer).init();
    } else {
        registry.init();
    }

    guard
}

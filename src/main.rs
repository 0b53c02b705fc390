use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod dataset;
mod error;
mod log;
mod model;
mod pipeline;
mod render;
mod stats;
mod summary;

pub type Result<T> = anyhow::Result<T>;

use config::{PipelineConfig, SummaryPolicy};

#[derive(Parser)]
#[command(name = "spm", version)]
#[command(about = "Service performance metrics from PerformanceLog folders", long_about = None)]
struct Cli {
    /// Base folder for generated results; each dataset gets a sub-folder.
    #[arg(long, global = true, env = "SPM_RESULT_ROOT", default_value = "result")]
    result: PathBuf,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse logs and write the CSV summaries and statistics.
    Generate {
        /// Data folder containing one sub-folder per version.
        #[arg(long, default_value = "data")]
        data: PathBuf,

        #[arg(long, value_enum, default_value_t = SummaryPolicy::SkipExisting)]
        policy: SummaryPolicy,
    },
    /// Build the results (unless --no-build) and write the HTML dashboard.
    Report {
        #[arg(long, default_value = "data")]
        data: PathBuf,

        #[arg(long, value_enum, default_value_t = SummaryPolicy::SkipExisting)]
        policy: SummaryPolicy,

        /// Reuse the existing combined summary instead of reading logs.
        #[arg(long)]
        no_build: bool,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Remove the result folder.
    Clean,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Generate { data, policy } => {
            let config = PipelineConfig::new(data, &cli.result).with_policy(policy);
            let outcome = pipeline::run(&config)?;
            info!(
                versions = outcome.versions().len(),
                skipped = outcome.skipped.len(),
                result = %config.result_root.display(),
                "generate completed"
            );
        }
        Commands::Report {
            data,
            policy,
            no_build,
            out,
        } => {
            let config = PipelineConfig::new(data, &cli.result).with_policy(policy);

            // 1) Build or reload the tables.
            let (combined, stats) = if no_build {
                pipeline::load_existing(&config)?
            } else {
                let outcome = pipeline::run(&config)?;
                for skipped in &outcome.skipped {
                    warn!(version = %skipped.name, reason = %skipped.reason, "version skipped");
                }
                (outcome.combined, outcome.stats)
            };

            // 2) Assemble.
            let dataset = config
                .result_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let reports = model::collect_reports(&config.result_root)?;
            let data = model::build_dashboard(&dataset, &combined, &stats, reports);

            // 3) Render HTML.
            let html = render::render_dashboard(&data)?;
            let out = out.unwrap_or_else(|| config.dashboard_path());
            std::fs::write(&out, html)
                .with_context(|| format!("write dashboard {}", out.display()))?;
            info!(path = %out.display(), "wrote dashboard");
        }
        Commands::Clean => {
            if !cli.result.exists() {
                info!(path = %cli.result.display(), "nothing to remove");
                return Ok(());
            }
            std::fs::remove_dir_all(&cli.result)?;
            info!(path = %cli.result.display(), "removed result folder");
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use consortium::{Consortium, ConsortiumConfig, ProviderRouter, TranscriptWriter};

/// Run one query through the model consortium and print the verdict.
#[derive(Debug, Parser)]
#[command(name = "consortium", version, about)]
struct Cli {
    /// File containing the query; reads stdin when omitted.
    query_file: Option<PathBuf>,

    /// Comma-separated member role ids (provider/model). Overrides
    /// CONSORTIUM_MEMBERS.
    #[arg(long)]
    members: Option<String>,

    /// Arbiter role id. Overrides CONSORTIUM_ARBITER.
    #[arg(long)]
    arbiter: Option<String>,

    /// Maximum refinement iterations. Overrides CONSORTIUM_MAX_ITERATIONS.
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Directory for raw member/arbiter transcripts.
    #[arg(long)]
    transcript_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let base = ConsortiumConfig::from_env()?;
    let members = match &cli.members {
        Some(raw) => consortium::config::parse_roster(raw)?,
        None => base.members,
    };
    let arbiter = match &cli.arbiter {
        Some(raw) => raw.trim().parse()?,
        None => base.arbiter,
    };
    let config = ConsortiumConfig::new(
        members,
        arbiter,
        cli.max_iterations.unwrap_or(base.max_iterations),
    )?;

    let query = read_query(cli.query_file.as_deref())?;

    let mut runner = Consortium::new(config, Arc::new(ProviderRouter::from_env()));
    if let Some(dir) = cli.transcript_dir {
        runner = runner.with_transcript(TranscriptWriter::new(dir));
    }

    let report = runner.run(query).await?;
    info!("{}", report.summary_line());

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn read_query(path: Option<&std::path::Path>) -> Result<String> {
    let query = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read query from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read query from stdin")?;
            buf
        }
    };
    let query = query.trim().to_string();
    anyhow::ensure!(!query.is_empty(), "query is empty");
    Ok(query)
}

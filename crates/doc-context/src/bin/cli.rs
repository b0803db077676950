//! doc-context command-line tool
//!
//! Run with: cargo run -p doc-context --features cli --bin doc-context -- ingest ./docs

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use doc_context::{
    config::DocContextConfig,
    generation::{ContextAssembler, ContextChat},
    ingestion::IngestionPipeline,
    providers::ChatClient,
    types::IngestionBatchResult,
};

/// Turn local documents into one LLM-ready context
#[derive(Parser, Debug)]
#[command(name = "doc-context")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $DOC_CONTEXT_CONFIG or the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract files and print the assembled context
    Ingest {
        /// Files or directories (walked recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print the full batch result as JSON instead of the context
        #[arg(long)]
        json: bool,
    },

    /// Extract files and print a model-written summary
    Summarize {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Extract files and answer a question about them
    Ask {
        /// Question to ask
        #[arg(short, long)]
        question: String,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

/// Expand directories into the files beneath them, keeping argument order
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            // Missing paths are reported as read failures by the pipeline
            files.push(path.clone());
        }
    }
    files
}

async fn ingest(
    pipeline: &IngestionPipeline,
    paths: &[PathBuf],
) -> anyhow::Result<IngestionBatchResult> {
    let files = expand_paths(paths);
    if files.is_empty() {
        anyhow::bail!("no files found");
    }

    tracing::info!("Ingesting {} file(s)", files.len());
    let batch_timeout = pipeline.config().batch_timeout();
    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => eprintln!("interrupted, keeping completed files"),
            _ = tokio::time::sleep(batch_timeout) => {}
        }
    };
    let result = pipeline.ingest_paths_until(&files, shutdown).await;

    for doc in result.failures() {
        if let Some(failure) = &doc.error {
            eprintln!("warning: {}: [{}] {}", doc.name, failure.kind, failure.message);
        }
    }
    if result.partial {
        eprintln!(
            "warning: batch cut short, {} file(s) not processed",
            result.not_processed.len()
        );
    }

    Ok(result)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "doc_context=debug"
    } else {
        "doc_context=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => DocContextConfig::from_file(path),
        None => DocContextConfig::load(),
    }
    .context("Failed to load configuration")?;

    let pipeline =
        IngestionPipeline::from_config(&config).context("Failed to create ingestion pipeline")?;

    match cli.command {
        Commands::Ingest { paths, json } => {
            let result = ingest(&pipeline, &paths).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", ContextAssembler::assemble(&result));
            }
        }
        Commands::Summarize { paths } => {
            let result = ingest(&pipeline, &paths).await?;
            let chat = ContextChat::new(Arc::new(ChatClient::new(&config.chat)?));
            let summary = chat.summarize(&ContextAssembler::assemble(&result)).await?;
            println!("{}", summary);
        }
        Commands::Ask { question, paths } => {
            let result = ingest(&pipeline, &paths).await?;
            let chat = ContextChat::new(Arc::new(ChatClient::new(&config.chat)?));
            let answer = chat
                .ask(&ContextAssembler::assemble(&result), &[], &question)
                .await?;
            println!("{}", answer);
        }
    }

    Ok(())
}

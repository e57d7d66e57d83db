//! Command-line front end for the docflow pipeline.
//!
//! A thin adapter over [`DocumentPipeline`]: reads a document file and a
//! prompt, runs them against the environment-configured generator, and
//! prints the JSON report.

use anyhow::{Context as _, Result};
use clap::Parser;
use docflow::events::TracingEventSink;
use docflow::generation::openai::{OpenAiConfig, OpenAiGenerator};
use docflow::pipeline::{DocumentPipeline, DocumentRequest};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "docflow",
    version,
    about = "Ask a question of a document through the staged answering pipeline"
)]
struct Cli {
    /// Path to the document text file.
    document: PathBuf,

    /// The question to answer.
    #[arg(short, long)]
    prompt: String,

    /// Maximum Review/Validation cycles before the run is failed.
    #[arg(long, default_value_t = 2)]
    max_review_cycles: u32,

    /// Validation pass mark (0-100).
    #[arg(long, default_value_t = 70)]
    score_threshold: u8,

    /// Model identifier override.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let source_text = std::fs::read_to_string(&cli.document)
        .with_context(|| format!("reading {}", cli.document.display()))?;

    let mut config = OpenAiConfig::from_env()?;
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }

    let pipeline = DocumentPipeline::builder()
        .generator(Arc::new(OpenAiGenerator::new(config)))
        .max_review_cycles(cli.max_review_cycles)
        .score_threshold(cli.score_threshold)
        .event_sink(Arc::new(TracingEventSink::default()))
        .build()?;

    match pipeline
        .run(DocumentRequest::new(source_text, cli.prompt))
        .await
    {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(failure) => {
            eprintln!("{failure}");
            eprintln!("stages visited:");
            for stage in &failure.context.history {
                eprintln!("  - {stage}");
            }
            std::process::exit(1);
        }
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use nyaya_core::acts::Act;
use nyaya_core::config::Config;
use nyaya_core::ingest::Ingestor;
use nyaya_core::pipeline::Pipeline;
use nyaya_index::{QdrantVectorStore, VectorStore};
use nyaya_llm::openai::OpenAiProvider;

#[derive(Parser)]
#[command(
    name = "nyaya",
    version,
    about = "Multi-act legal advisor over BNS, IPC, CrPC, CPC, and BSA"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = "nyaya.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a legal question or analyze a scenario.
    Ask {
        /// The question or fact pattern, as free text.
        query: Vec<String>,
    },
    /// Create the per-corpus vector indexes.
    Provision,
    /// Embed a chunk JSON file into one corpus's index.
    Ingest {
        /// Corpus the file belongs to (bns, ipc, crpc, cpc, bsa).
        #[arg(long, value_parser = parse_act)]
        act: Act,
        /// Path to the chunk JSON file.
        #[arg(long)]
        file: PathBuf,
    },
}

fn parse_act(s: &str) -> Result<Act, String> {
    Act::parse(s).ok_or_else(|| format!("unknown act '{s}' (expected bns, ipc, crpc, cpc, or bsa)"))
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_provider(config: &Config) -> anyhow::Result<OpenAiProvider> {
    let Some(api_key) = Config::api_key() else {
        bail!("no API key found: set NYAYA_LLM_API_KEY or OPENAI_API_KEY");
    };
    Ok(OpenAiProvider::new(
        api_key,
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        Some(config.llm.embedding_model.clone()),
    ))
}

fn print_answer(answer: &nyaya_core::Answer) {
    println!("{}\n", answer.analysis);

    if !answer.citations.is_empty() {
        println!("Referenced Sections");
        for group in &answer.citations {
            println!("  {}", group.act);
            for citation in &group.citations {
                println!("    - {}: {}", citation.display, citation.heading);
            }
        }
        println!();
    }

    tracing::info!(
        retrieval_ms = answer.retrieval_ms,
        generation_ms = answer.generation_ms,
        "answer timings"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let provider = Arc::new(build_provider(&config)?);
    let store: Arc<dyn VectorStore> = Arc::new(
        QdrantVectorStore::new(&config.index.qdrant_url)
            .map_err(|e| anyhow::anyhow!("failed to connect to Qdrant: {e}"))?,
    );

    match cli.command {
        Command::Ask { query } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                bail!("empty query");
            }
            let pipeline = Pipeline::new(provider, store, config.retrieval.clone());
            let answer = pipeline.answer(&query).await;
            print_answer(&answer);
        }
        Command::Provision => {
            let ingestor = Ingestor::new(provider, store, config.index.dimension);
            ingestor.provision_indexes().await?;
        }
        Command::Ingest { act, file } => {
            let ingestor = Ingestor::new(provider, store, config.index.dimension);
            let report = ingestor
                .ingest_act(act, &file)
                .await
                .with_context(|| format!("ingestion failed for {act}"))?;
            tracing::info!(act = %act, chunks = report.chunks, batches = report.batches, "ingestion complete");
        }
    }

    Ok(())
}

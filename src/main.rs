use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nlu_embed_lib::{linked_model_version, EngineConfig, LanguageTag, NluEngine, SharedNluEngine};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nlu-embed")]
#[command(about = "Parse utterances with the native NLU engine")]
struct Cli {
    /// Engine config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model directory, replaces any source from config or environment
    #[arg(long)]
    data_path: Option<PathBuf>,

    /// Serialized model file, replaces any source from config or environment
    #[arg(long)]
    data_binary: Option<PathBuf>,

    /// Language tag of the model
    #[arg(short, long)]
    language: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the model version the linked engine understands
    Version,
    #[command(flatten)]
    Engine(EngineCommand),
}

/// Subcommands that need a loaded model.
#[derive(Subcommand)]
enum EngineCommand {
    /// Parse queries given as arguments, or one per line from stdin
    Parse { queries: Vec<String> },
    /// Extract the slots of a query for a known intent
    Tag {
        #[arg(short, long)]
        intent: String,
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Version => {
            println!("{}", linked_model_version()?);
            return Ok(());
        }
        Commands::Engine(command) => command,
    };

    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(language) = &cli.language {
        config.language = LanguageTag::new(language)?;
    }
    if cli.data_path.is_some() || cli.data_binary.is_some() {
        config.data_path = cli.data_path.clone();
        config.data_binary = cli.data_binary.clone();
    }

    let source = config.model_source()?;
    let engine = NluEngine::new(config.language.clone(), &source)
        .with_context(|| format!("loading {:?}", source))?;
    drop(source);
    let engine = SharedNluEngine::new(engine);

    let outcome = run(&engine, &config, command).await;
    engine.dispose()?;
    outcome
}

async fn run(engine: &SharedNluEngine, config: &EngineConfig, command: EngineCommand) -> anyhow::Result<()> {
    match command {
        EngineCommand::Parse { queries } if !queries.is_empty() => {
            for query in queries {
                parse_and_print(engine, config, query).await?;
            }
        }
        EngineCommand::Parse { .. } => {
            for line in io::stdin().lock().lines() {
                let line = line.context("reading stdin")?;
                if line.trim().is_empty() {
                    continue;
                }
                parse_and_print(engine, config, line).await?;
            }
        }
        EngineCommand::Tag { intent, query } => {
            let entities = engine.tag(&query, &intent)?;
            print_document(config, &serde_json::to_value(entities)?)?;
        }
    }
    Ok(())
}

async fn parse_and_print(engine: &SharedNluEngine, config: &EngineConfig, query: String) -> anyhow::Result<()> {
    let document = engine.parse_async(query, config.parse_timeout()).await?;
    print_document(config, &document)
}

fn print_document(config: &EngineConfig, document: &Value) -> anyhow::Result<()> {
    let text = if config.parse.pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    println!("{}", text);
    Ok(())
}

//! `passage` command-line interface.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use passage_retrieval::{KnowledgeBase, RagConfig};

#[derive(Parser)]
#[command(
    name = "passage",
    version,
    about = "Index documents and retrieve context for prompts"
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a document and write it into the knowledge base.
    Ingest {
        /// Input text file.
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Document title; defaults to the file stem.
        #[arg(long)]
        title: Option<String>,

        /// Print the detected sections without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Retrieve formatted context for a query.
    Query {
        /// Query text. Omit with --interactive.
        text: Option<String>,

        /// Read queries from stdin until EOF or an empty line.
        #[arg(short, long)]
        interactive: bool,
    },
}

/// Load the config file: explicit path, then the user config directory,
/// then built-in defaults.
fn load_config(path: Option<PathBuf>) -> anyhow::Result<RagConfig> {
    if let Some(path) = path {
        return RagConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display()));
    }

    let default = dirs::config_dir().map(|dir| dir.join("passage").join("config.toml"));
    match default {
        Some(path) if path.exists() => RagConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        _ => Ok(RagConfig::default()),
    }
}

async fn run_ingest(
    kb: &KnowledgeBase,
    input: &Path,
    title: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let title = title.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    });

    if dry_run {
        let sections = kb.parse(&text, &title);
        println!("Detected {} sections:", sections.len());
        for section in sections {
            println!(
                "{:>4}  {}  ({} chars)",
                section.ordinal,
                section.name,
                section.content.len()
            );
        }
        return Ok(());
    }

    let report = kb.ingest(&text, &title).await?;
    println!(
        "Indexed '{title}': {} rows across {} sections",
        report.rows,
        report.sections.len()
    );
    Ok(())
}

async fn run_interactive(kb: &KnowledgeBase) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "query> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() || query == "exit" || query == "quit" {
            break;
        }

        match kb.context(query).await {
            Ok(context) => println!("{context}\n"),
            Err(err) => eprintln!("error: {err}"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let kb = KnowledgeBase::open(config).await?;

    match cli.command {
        Command::Ingest {
            input,
            title,
            dry_run,
        } => run_ingest(&kb, &input, title, dry_run).await?,
        Command::Query { text, interactive } => {
            if interactive {
                run_interactive(&kb).await?;
            } else {
                let text =
                    text.context("provide a query, or pass --interactive to read from stdin")?;
                println!("{}", kb.context(&text).await?);
            }
        }
    }

    Ok(())
}

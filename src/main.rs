//! # Scheme RAG CLI (`srag`)
//!
//! ## Usage
//!
//! ```bash
//! srag --config ./config/srag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `srag build <input>` | Chunk raw scheme records into the NDJSON artifact |
//! | `srag upsert` | Upsert the artifact into the index in batches |
//! | `srag search "<query>"` | Print the retrieved context lines |
//! | `srag ask "<question>"` | Answer one question |
//! | `srag chat` | Interactive session over stdin |
//! | `srag prompt "<question>"` | Print the prompt that `ask` would send |
//!
//! ## Examples
//!
//! ```bash
//! # Build chunks from a scheme dump
//! srag build schemeData.json --out rag.jsonl
//!
//! # Push them to Pinecone (PINECONE_API_KEY must be set)
//! srag upsert --input rag.jsonl
//!
//! # Ask a question
//! srag ask "Who is eligible for PM Kisan?"
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use scheme_rag::chat::{ChatSettings, Orchestrator, ReplyKind};
use scheme_rag::config::{self, Config};
use scheme_rag::gateways::{create_backend, create_index};
use scheme_rag::{ingest, logging, search};
use scheme_rag_core::gateway::memory::InMemoryConversationStore;

const DEFAULT_SESSION: &str = "default";

/// Scheme RAG CLI: ingest government scheme records and answer questions
/// about them.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means all defaults.
#[derive(Parser)]
#[command(
    name = "srag",
    about = "Scheme RAG: retrieval-augmented answers about government schemes",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/srag.toml")]
    config: PathBuf,

    /// More log output (repeat for more).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the NDJSON chunk artifact from raw scheme records.
    ///
    /// Input may be a JSON array, a single JSON object, or JSON Lines.
    /// Records that cannot be processed are reported and skipped.
    Build {
        /// Raw scheme records (JSON or JSONL).
        input: PathBuf,

        /// Output artifact. Defaults to `index.artifact`.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Upsert the chunk artifact into the index.
    Upsert {
        /// Artifact to read. Defaults to `index.artifact`.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Records per upsert call (at most 96).
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Retrieve and print context for a query.
    Search {
        query: String,

        /// Number of context lines to keep.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Answer a single question.
    Ask {
        question: String,

        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
    },

    /// Interactive chat over stdin. `/clear` resets the history, `/exit` quits.
    Chat {
        /// Session id. A fresh one is generated when omitted.
        #[arg(long)]
        session: Option<String>,
    },

    /// Print the composed prompt for a question without calling inference.
    Prompt {
        question: String,

        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let cfg = config::load_or_minimal(&cli.config)?;

    match cli.command {
        Commands::Build { input, out } => {
            let out = out.unwrap_or_else(|| cfg.index.artifact.clone());
            ingest::run_build(&cfg, &input, &out)?;
        }
        Commands::Upsert { input, batch_size } => {
            ingest::run_upsert(&cfg, input.as_deref(), batch_size).await?;
        }
        Commands::Search { query, top_k } => {
            search::run_search(&cfg, &query, top_k).await?;
        }
        Commands::Ask { question, session } => {
            run_ask(&cfg, &session, &question).await?;
        }
        Commands::Chat { session } => {
            let session = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            run_chat(&cfg, &session).await?;
        }
        Commands::Prompt { question, session } => {
            let index = create_index(&cfg).await?;
            let store = InMemoryConversationStore::new();
            let orchestrator =
                Orchestrator::new(index.as_ref(), &store, ChatSettings::from_config(&cfg));
            println!("{}", orchestrator.build_prompt(&session, &question).await?);
        }
    }

    Ok(())
}

async fn run_ask(cfg: &Config, session: &str, question: &str) -> Result<()> {
    let index = create_index(cfg).await?;
    let backend = create_backend(&cfg.inference)?;
    let store = InMemoryConversationStore::new();
    let orchestrator = Orchestrator::new(index.as_ref(), &store, ChatSettings::from_config(cfg))
        .with_backend(backend.as_ref());

    let reply = orchestrator.reply(session, question).await?;
    println!("{}", reply.text);
    if reply.kind == ReplyKind::Unavailable {
        bail!("upstream service unavailable");
    }
    Ok(())
}

async fn run_chat(cfg: &Config, session: &str) -> Result<()> {
    let index = create_index(cfg).await?;
    let backend = create_backend(&cfg.inference)?;
    let store = InMemoryConversationStore::new();
    let orchestrator = Orchestrator::new(index.as_ref(), &store, ChatSettings::from_config(cfg))
        .with_backend(backend.as_ref());

    let interactive = atty::is(atty::Stream::Stdin);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if interactive {
        println!("Session {}. Type /clear to reset, /exit to quit.", session);
    }

    loop {
        if interactive {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                orchestrator.clear(session).await?;
                println!("History cleared.");
            }
            message => {
                let reply = orchestrator.reply(session, message).await?;
                println!("{}\n", reply.text);
            }
        }
    }

    Ok(())
}

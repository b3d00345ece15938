use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use shelf_client::{ReqwestClient, UploadRequest};
use shelf_logging::{parse_level, shelf_info};

use crate::platform::app::{self, SurfaceDriver};
use crate::platform::config::{AppConfig, API_BASE_ENV};
use crate::platform::effects::EffectRunner;
use crate::platform::library::Library;
use crate::platform::logging;

/// Silence tolerated on top of the request timeout before a loading
/// surface is given up on.
const STALL_MARGIN: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "studyshelf")]
#[command(about = "Study library client: documents, summaries, flashcards and Q&A")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config RON. If omitted, uses ./studyshelf.ron if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend base URL; overrides the config file and STUDYSHELF_API_BASE.
    #[arg(long)]
    pub api_base: Option<String>,

    /// Override log level (trace/debug/info/warn/error/off).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every document in the library.
    Files,
    /// Search documents by keyword, or by meaning with --semantic.
    Search {
        query: String,
        #[arg(long)]
        semantic: bool,
    },
    /// Upload a document.
    Upload {
        path: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        /// Comma-separated tags.
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Upload even if the library already holds the same content.
        #[arg(long)]
        force: bool,
    },
    Delete {
        id: String,
    },
    /// Save a document into a directory (default: current directory).
    Download {
        id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show a document's summary, generating it with --generate.
    Summary {
        id: String,
        #[arg(long)]
        generate: bool,
    },
    /// Show a document's flashcards, generating them with --generate.
    Flashcards {
        id: String,
        #[arg(long)]
        generate: bool,
    },
    /// Ask one or more questions about a document. All are answered
    /// concurrently.
    Ask {
        id: String,
        #[arg(required = true)]
        questions: Vec<String>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_api_base_overrides(std::env::var(API_BASE_ENV).ok(), args.api_base.clone());
    init_logging(&args, &config)?;
    shelf_info!("studyshelf using {}", config.api_base);

    let client = ReqwestClient::new(config.client_settings())?;
    let output = match args.cmd {
        Command::Files => Library::new(client)?.files()?,
        Command::Search { query, semantic } => Library::new(client)?.search(&query, semantic)?,
        Command::Upload {
            path,
            title,
            subject,
            tags,
            force,
        } => {
            let request = UploadRequest {
                title,
                subject,
                tags: tags
                    .into_iter()
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect(),
                force,
                ..UploadRequest::new(path)
            };
            Library::new(client)?.upload(&request)?
        }
        Command::Delete { id } => Library::new(client)?.delete(&id)?,
        Command::Download { id, out } => {
            let dir = out.unwrap_or_else(|| PathBuf::from("."));
            Library::new(client)?.download(&id, &dir)?
        }
        Command::Summary { id, generate } => {
            app::summary(&mut surface_driver(client, &config)?, &id, generate)?
        }
        Command::Flashcards { id, generate } => {
            app::flashcards(&mut surface_driver(client, &config)?, &id, generate)?
        }
        Command::Ask { id, questions } => {
            app::ask(&mut surface_driver(client, &config)?, &id, &questions)?
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .context("writing output")
}

fn surface_driver(client: ReqwestClient, config: &AppConfig) -> Result<SurfaceDriver> {
    let runner = EffectRunner::new(Arc::new(client)).context("starting engine")?;
    let stall_limit = Duration::from_millis(config.request_timeout_ms) + STALL_MARGIN;
    Ok(SurfaceDriver::new(runner, stall_limit))
}

fn init_logging(args: &Args, config: &AppConfig) -> Result<()> {
    let raw = args.log_level.as_deref().unwrap_or(config.log.level.as_str());
    let level = parse_level(raw).ok_or_else(|| anyhow!("unknown log level {raw:?}"))?;
    logging::initialize(config.log.destination, level);
    Ok(())
}

//! ragline - ask a progressive search-and-generation pipeline from the terminal
//!
//! Streams the answer to stdout as it is generated; pipeline progress goes
//! to stderr so the answer stays pipeable.

mod render;

use std::io::Write;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use ragline_core::{
    citations, config, ClientConfig, QueryRequest, StreamSession, TransportKind,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportArg {
    /// Unidirectional SSE stream over HTTP
    Sse,
    /// Full-duplex WebSocket
    Ws,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Sse => TransportKind::Sse,
            TransportArg::Ws => TransportKind::WebSocket,
        }
    }
}

#[derive(Parser)]
#[command(name = "ragline", version, about = "Streaming client for a RAG pipeline")]
struct Cli {
    /// Question to ask the pipeline
    query: String,

    /// Number of sources to retrieve
    #[arg(long, default_value_t = 8)]
    top_k: u32,

    /// Skip the query-refinement phase
    #[arg(long)]
    no_refine: bool,

    /// Skip the reranking phase
    #[arg(long)]
    no_reranker: bool,

    /// Transport used to reach the pipeline
    #[arg(long, value_enum, default_value_t = TransportArg::Sse)]
    transport: TransportArg,

    /// Pipeline base URL
    #[arg(long, env = config::API_URL_ENV, default_value = config::DEFAULT_API_URL)]
    api_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(&cli.api_url)?;
    let session = StreamSession::new(config, cli.transport.into());
    let mut rx = session.subscribe();

    tracing::debug!(api_url = %cli.api_url, transport = ?cli.transport, "submitting query");

    session.start(QueryRequest {
        query: cli.query,
        top_k: cli.top_k,
        refine_query: !cli.no_refine,
        use_reranker: !cli.no_reranker,
    });

    let mut stdout = std::io::stdout();
    let mut printed = String::new();
    let mut last_status = String::new();

    loop {
        rx.changed().await?;
        let state = rx.borrow().clone();

        if state.status_message != last_status && !state.status_message.is_empty() {
            eprintln!("{}", render::status_line(&state));
            last_status.clone_from(&state.status_message);
        }

        if state.answer != printed {
            if let Some(suffix) = state.answer.strip_prefix(printed.as_str()) {
                write!(stdout, "{suffix}")?;
            } else {
                // A complete event replaced the accumulated answer wholesale
                writeln!(stdout)?;
                write!(stdout, "{}", state.answer)?;
            }
            stdout.flush()?;
            printed.clone_from(&state.answer);
        }

        // Terminal stage, or the stream ended without one
        if !state.is_loading {
            break;
        }
    }

    let state = session.snapshot();
    tracing::debug!(stage = %state.stage, "session finished");
    writeln!(stdout)?;

    if let Some(refined) = &state.refined_query {
        eprintln!("Refined query: {refined}");
    }

    let cited = citations::resolve_citations(&state.answer, &state.sources);
    if !cited.is_empty() {
        writeln!(stdout)?;
        write!(stdout, "{}", render::references(&cited))?;
    }

    Ok(())
}

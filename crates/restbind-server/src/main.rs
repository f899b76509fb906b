//! Demo server.
//!
//! Serves a small in-memory note store:
//!
//! ```text
//! GET    /notes            list notes
//! POST   /notes            create a note    {"text": ".."}
//! GET    /notes/:id        fetch a note
//! PUT    /notes/:id        replace a note   {"text": ".."}
//! DELETE /notes/:id        delete a note
//! GET    /integer/:id      id + 33
//! GET    /teapot           418
//! ```
//!
//! Run `restbind-demo --help` for configuration options.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use restbind_core::prelude::*;
use restbind_server::logging::{init_logging, LogConfig};
use restbind_server::{Router, Server, ServerConfig};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
struct Note {
    id: u64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct NoteInput {
    text: String,
}

#[derive(Debug, Default)]
struct Notes {
    next_id: u64,
    items: BTreeMap<u64, Note>,
}

type Store = Arc<RwLock<Notes>>;

fn not_found(id: u64) -> restbind_core::BoxError {
    errorf!(StatusCode::NOT_FOUND, "note {} does not exist", id)
}

fn validate(input: &NoteInput) -> HandlerResult<()> {
    if input.text.trim().is_empty() {
        return Err(restbind_core::error(StatusCode::BAD_REQUEST, "text must not be empty"));
    }
    Ok(())
}

fn routes(store: &Store) -> Router {
    let list = {
        let store = Arc::clone(store);
        move || {
            let store = Arc::clone(&store);
            async move {
                let notes = store.read().await;
                HandlerResult::Ok(notes.items.values().cloned().collect::<Vec<_>>())
            }
        }
    };

    let create = {
        let store = Arc::clone(store);
        move |Json(input): Json<NoteInput>| {
            let store = Arc::clone(&store);
            async move {
                validate(&input)?;
                let mut notes = store.write().await;
                notes.next_id += 1;
                let note = Note {
                    id: notes.next_id,
                    text: input.text,
                };
                notes.items.insert(note.id, note.clone());
                HandlerResult::Ok(Json(note))
            }
        }
    };

    let fetch = {
        let store = Arc::clone(store);
        move |id: u64| {
            let store = Arc::clone(&store);
            async move {
                let notes = store.read().await;
                notes.items.get(&id).cloned().map(Json).ok_or_else(|| not_found(id))
            }
        }
    };

    let replace = {
        let store = Arc::clone(store);
        move |id: u64, Json(input): Json<NoteInput>| {
            let store = Arc::clone(&store);
            async move {
                validate(&input)?;
                let mut notes = store.write().await;
                let note = notes.items.get_mut(&id).ok_or_else(|| not_found(id))?;
                note.text = input.text;
                HandlerResult::Ok(Json(note.clone()))
            }
        }
    };

    let remove = {
        let store = Arc::clone(store);
        move |ctx: Context, id: u64| {
            let store = Arc::clone(&store);
            async move {
                let removed = store.write().await.items.remove(&id);
                tracing::info!(request_id = %ctx.request_id(), id, found = removed.is_some(), "delete note");
                removed.map(|_| ()).ok_or_else(|| not_found(id))
            }
        }
    };

    Router::new()
        .get("/notes", list)
        .post("/notes", create)
        .get("/notes/:id", fetch)
        .put("/notes/:id", replace)
        .del("/notes/:id", remove)
        .get("/integer/:id", |id: i64| async move { HandlerResult::Ok(id + 33) })
        .get("/teapot", || async { HandlerResult::Ok(StatusCode::IM_A_TEAPOT) })
}

/// Command-line arguments.
struct Args {
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = std::env::args().skip(1);
        let mut config = std::env::var_os("RESTBIND_CONFIG").map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("--config needs a path")?;
                    config = Some(PathBuf::from(path));
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("restbind-demo {}", env!("CARGO_PKG_VERSION"));
                    std::process::exit(0);
                }
                other => anyhow::bail!("unknown argument: {other} (use --help for usage)"),
            }
        }

        Ok(Self { config })
    }
}

fn print_help() {
    println!(
        r"restbind-demo - in-memory note service

USAGE:
    restbind-demo [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    RESTBIND_CONFIG                  Configuration file, if --config is absent
    RESTBIND_HTTP_ADDR               Listen address (default: 0.0.0.0:8080)
    RESTBIND_MAX_CONNECTIONS         Open connection limit (default: none)
    RESTBIND_MAX_BODY_BYTES          Request body limit (default: 2 MiB)
    RESTBIND_SHUTDOWN_TIMEOUT_SECS   Drain timeout (default: 30)
    RESTBIND_REQUEST_TIMEOUT_SECS    Handler deadline (default: 30)
    RESTBIND_LOG_FORMAT              'pretty' for human readable logs
    RUST_LOG                         Log filter
"
    );
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    let config = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading configuration");
            ServerConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?
        }
        None => ServerConfig::default(),
    };
    let config = config
        .with_env_overrides()
        .context("applying environment overrides")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse()?;

    let log_config = match std::env::var("RESTBIND_LOG_FORMAT").as_deref() {
        Ok("pretty") => LogConfig::development(),
        _ => LogConfig::production(),
    };
    init_logging(&log_config.with_env_filter())?;

    let config = load_config(args.config.as_deref())?;
    let store = Store::default();
    let router = routes(&store);

    for route in router.routes() {
        tracing::info!(method = %route.method, pattern = %route.pattern, "route");
    }

    Server::new(config).serve(router).await?;
    Ok(())
}

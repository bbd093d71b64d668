//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use tracing::debug;

use athena_client::{create_backend, AthenaConfig};
use athena_core::session::QuizSession;
use athena_core::storage::{JsonFileStore, KeyValueStore};
use athena_core::traits::QuizBackend;

pub mod countdown;
pub mod explain;
pub mod favorite;
pub mod init;
pub mod list;
pub mod manage;
pub mod notes;
pub mod quiz;
pub mod render;
pub mod review;
pub mod scrape;

/// Configuration plus the backend and local store it describes.
pub struct Context {
    pub config: AthenaConfig,
    pub backend: Arc<dyn QuizBackend>,
    pub store: Arc<dyn KeyValueStore>,
}

impl Context {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = athena_client::config::load_config_from(config_path)?;
        let backend = create_backend(&config)?;
        debug!(backend = %config.backend_url(), store = %config.store_path.display(), "connecting");
        let store = JsonFileStore::open(&config.store_path).with_context(|| {
            format!("failed to open local state {}", config.store_path.display())
        })?;
        Ok(Self {
            config,
            backend,
            store: Arc::new(store),
        })
    }
}

/// Load a quiz session. With `shuffle_seed` the options are shuffled, and the
/// same seed gives the same option order on every run.
pub async fn open_session(
    config_path: Option<&Path>,
    quiz_set: &str,
    shuffle_seed: Option<u64>,
) -> Result<QuizSession> {
    let ctx = Context::load(config_path)?;
    let mut session = QuizSession::new(ctx.backend, quiz_set).with_store(ctx.store);
    if let Some(seed) = shuffle_seed {
        session = session.with_rng_seed(seed).with_options_shuffled(true);
    }
    if !session.load().await {
        bail!("failed to load quiz set {quiz_set}");
    }
    Ok(session)
}

/// Read a file, or stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin"),
    }
}

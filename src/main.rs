mod classifier;
mod color;
mod config;
mod data;
mod predict;
mod render;
mod server;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load().context("loading configuration")?;
    info!("configuration: {config:?}");

    // A model set that fails to load stops the process before it can serve.
    let models = classifier::load_models(&config.model_path)
        .with_context(|| format!("loading models from {}", config.model_path.display()))?;

    let state = Arc::new(AppState::new(models));
    let app = server::router(state, config.max_upload_bytes);

    server::serve(config.socket_addr(), app)
        .await
        .with_context(|| format!("serving on {}", config.socket_addr()))
}

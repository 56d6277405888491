use std::process::ExitCode;

use flythrough::{AppConfig, SceneConfig};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flythrough=info")),
        )
        .init();

    tracing::info!("flythrough v{} starting", env!("CARGO_PKG_VERSION"));

    let scene_config = match SceneConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("config load failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    match flythrough::run(AppConfig::default(), scene_config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

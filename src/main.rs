use app::App;
use config::Config;
use iced::{Application, Settings};
use tracing::info;

mod api;
mod app;
mod config;
mod debounce;
mod error;
mod filter;
mod models;
mod prefs;
mod progress;
mod state;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!(deployment = ?config.deployment, set = %config.set_code, "starting binder");

    let settings = Settings::with_flags(config);

    App::run(settings)?;
    Ok(())
}

//! Backend entry-point: loads settings, wires adapters and serves the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, build_http_state, create_server};
use voiceit::inbound::http::health::HealthState;
use voiceit::inbound::http::token_config::{BuildMode, token_settings_from_env};
use voiceit::settings::AppSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let token = token_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    info!(
        fingerprint = %token.fingerprint,
        ephemeral = token.ephemeral,
        "token signing secret loaded"
    );
    if settings.dev_mode {
        warn!("development mode: internal error details are returned to clients");
    }

    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let http_state =
        build_http_state(&settings, &token.secret, &DefaultEnv::new(), Arc::new(DefaultClock)).await?;

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(bind_addr).with_dev_mode(settings.dev_mode);
    info!(bind_addr = %config.bind_addr(), "starting HTTP server");
    create_server(health_state, http_state, config)?.await
}

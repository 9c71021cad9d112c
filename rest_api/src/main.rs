// rest_api/src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use models::{NewUser, Role};
use rest_api::{app, config::AppConfig, AppState};
use storage::Storage;

/// Ensures the bootstrap admin from config exists, so a fresh deployment
/// has a way in. Existing accounts are left untouched.
fn ensure_admin(storage: &Arc<Storage>, config: &AppConfig) -> Result<()> {
    if storage.users.find_by_email(&config.admin_email)?.is_some() {
        return Ok(());
    }
    let admin = storage.users.create(NewUser {
        username: config.admin_username.clone(),
        email: config.admin_email.clone(),
        password: config.admin_password.clone(),
        gender: String::new(),
        role: Role::Admin,
        driver_id: None,
        subdriver_id: None,
        vehicle_number: None,
        school_id: None,
        greeter_id: None,
    })?;
    tracing::info!(user_id = %admin.id, email = %admin.email, "created bootstrap admin");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let storage =
        Storage::open(&config.data_directory).context("failed to open the data directory")?;
    ensure_admin(&storage, &config).context("failed to ensure the bootstrap admin")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid host/port in configuration")?;
    let state = AppState::new(storage, &config);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, "language limousine api listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

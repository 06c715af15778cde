// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use tracing::info;
use tracing_subscriber::EnvFilter;

use plotvault::api::router;
use plotvault::auth::AuthConfig;
use plotvault::config::{env_or_default, DATA_DIR_ENV, DB_FILE_NAME, DEFAULT_DATA_DIR};
use plotvault::events::EventBus;
use plotvault::providers::{CryptoRateClient, CustodyClient, ForexRateClient, MailClient};
use plotvault::provisioning::ProvisioningConfig;
use plotvault::state::AppState;
use plotvault::storage::AppDatabase;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    if env_or_default("LOG_FORMAT", "pretty") == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    // Open the embedded database
    let data_dir = PathBuf::from(env_or_default(DATA_DIR_ENV, DEFAULT_DATA_DIR));
    let db = AppDatabase::open(&data_dir.join(DB_FILE_NAME)).expect("Failed to open database");

    // Wire up provider clients
    let custody =
        CustodyClient::from_env().expect("Custody provider configuration is required (CUSTODY_API_KEY)");
    let crypto_rates = CryptoRateClient::from_env().expect("Failed to build crypto rate client");
    let forex_rates = ForexRateClient::from_env().expect("Failed to build forex rate client");
    let mail = MailClient::from_env().expect("Failed to build mail client");
    if !mail.is_configured() {
        info!("RESEND_API_KEY not set, transactional mail is disabled");
    }

    let auth = AuthConfig::from_env();
    if !auth.is_production() {
        info!("JWT_SECRET not set, running with development token validation");
    }

    let state = AppState::new(
        db,
        Arc::new(custody),
        crypto_rates,
        forex_rates,
        mail,
        EventBus::new(),
        auth,
        ProvisioningConfig::from_env(),
    );
    let app = router(state);

    // Parse bind address
    let host = env_or_default("HOST", "0.0.0.0");
    let port: u16 = env_or_default("PORT", "8080").parse().unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    info!("Plotvault server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

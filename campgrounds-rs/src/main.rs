//! # campgrounds-rs
//!
//! Server-rendered campground listing and review web app.
//!
//! Users register and log in with cookie sessions, create campground listings
//! they own, and browse listings created by others. Mutating a listing requires
//! being its author; violations redirect back into the UI with a flash message
//! instead of an error page.
//!
//! ## Architecture
//!
//! - **Stores**: in-memory document stores for users and campgrounds, optionally
//!   preloaded from a TOML seed file
//! - **Sessions**: token cookie -> session record with an optional user binding
//!   and a consume-once flash queue
//! - **HTTP**: Axum router with rate limiting, request IDs, and graceful shutdown

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod campground;
mod config;
mod http;
mod schema;
mod seed;
mod users;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::campground::CampgroundStore;
use crate::config::{AppConfig, Cli};
use crate::http::{router, AppState, SessionStore};
use crate::seed::load_seed;
use crate::users::UserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    info!(
        bind = %config.bind,
        session_ttl = %humantime::format_duration(config.session_ttl),
        secure_cookies = config.secure_cookies,
        seed_file = ?config.seed_file.as_ref().map(|path| path.display().to_string()),
        "configuration loaded"
    );

    let users = UserStore::new();
    let campgrounds = CampgroundStore::new();

    if let Some(path) = config.seed_file.as_deref() {
        let summary = load_seed(path, &users, &campgrounds)
            .with_context(|| format!("failed to load seed file {}", path.display()))?;
        info!(
            users = summary.users,
            campgrounds = summary.campgrounds,
            "seed data loaded"
        );
    }

    if users.is_empty() && campgrounds.is_empty() {
        info!("starting with empty stores; the first visitor can register at /register");
    }

    let sessions = SessionStore::new(config.session_ttl);
    spawn_session_sweeper(sessions.clone(), Duration::from_secs(300));

    let state = AppState {
        users,
        campgrounds,
        sessions,
        secure_cookies: config.secure_cookies,
    };

    let app = router(state);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "campgrounds-rs listening");

    serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = shutdown.await;
        info!("shutting down gracefully");
    })
    .await
    .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

/// Spawns a background task that drops expired sessions on an interval.
fn spawn_session_sweeper(sessions: SessionStore, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                info!(sessions = purged, "expired sessions purged");
            }
        }
    });
}

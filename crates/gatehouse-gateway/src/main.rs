//! Gatehouse Gateway - HTTP edge gateway
//!
//! This is the main entry point for the gateway service. Configuration is read
//! from the environment (see [`GatewayConfig::from_env`]).
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` to replace the remote session and user
//! services with in-memory ones. A demo administrator is seeded with the
//! credentials in `DEV_USER_EMAIL` / `DEV_USER_PASSWORD`
//! (default `admin@gatehouse.local` / `admin`).
//!
//! # Shutdown
//!
//! On SIGINT or SIGTERM the listener stops accepting and in-flight requests
//! get `SHUTDOWN_GRACE_SECONDS` to finish.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_auth::TokenMaker;
use gatehouse_control::AuthService;
use gatehouse_gateway::{create_router, GatewayConfig, GatewayState};
#[cfg(not(feature = "dev-mode"))]
use gatehouse_rpc::{HttpIdentityService, HttpSessionStore};
use gatehouse_rpc::{IdentityService, SessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gatehouse=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gatehouse Gateway");

    let config = GatewayConfig::from_env()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        environment = ?config.environment,
        session_service_url = %config.session_service_url,
        user_service_url = %config.user_service_url,
        max_sessions_per_identity = config.max_sessions_per_identity,
        cookie_secure = config.cookie_secure,
        "Gateway configuration loaded"
    );

    #[cfg(feature = "dev-mode")]
    let (sessions, users) = {
        tracing::warn!("DEV MODE ENABLED - using in-memory session and user services");
        dev::services()?
    };

    #[cfg(not(feature = "dev-mode"))]
    let (sessions, users) = {
        let timeouts = config.call_timeouts();
        (
            Arc::new(HttpSessionStore::new(
                config.session_service_url.clone(),
                timeouts,
            )),
            Arc::new(HttpIdentityService::new(
                config.user_service_url.clone(),
                timeouts,
            )),
        )
    };

    serve(config, sessions, users).await
}

async fn serve<S, I>(
    config: GatewayConfig,
    sessions: Arc<S>,
    users: Arc<I>,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: SessionStore + 'static,
    I: IdentityService + 'static,
{
    let auth = config.auth_config();
    let tokens = Arc::new(TokenMaker::new(&auth)?);
    let control = Arc::new(AuthService::new(
        Arc::clone(&tokens),
        &auth,
        sessions,
        users,
        &config.control_config(),
    ));
    tracing::info!("Authentication service initialized");

    let listen_addr = config.listen_addr.clone();
    let grace = config.shutdown_grace();
    let app = create_router(GatewayState::new(control, tokens, config));

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    tracing::info!(grace_seconds = grace.as_secs(), "Shutting down, draining requests");
    let _ = stop_tx.send(true);

    match tokio::time::timeout(grace, server).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!("Grace period elapsed with requests still in flight"),
    }

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[cfg(feature = "dev-mode")]
mod dev {
    use std::sync::Arc;

    use gatehouse_auth::hash_password;
    use gatehouse_core::UserId;
    use gatehouse_rpc::memory::{MemoryIdentityService, MemorySessionStore};
    use gatehouse_rpc::UserRecord;

    pub(crate) fn services(
    ) -> Result<(Arc<MemorySessionStore>, Arc<MemoryIdentityService>), gatehouse_auth::AuthError>
    {
        let email =
            std::env::var("DEV_USER_EMAIL").unwrap_or_else(|_| "admin@gatehouse.local".into());
        let password = std::env::var("DEV_USER_PASSWORD").unwrap_or_else(|_| "admin".into());

        let users = MemoryIdentityService::new();
        users.insert(UserRecord {
            id: UserId::new(1),
            name: "Dev Admin".to_string(),
            email: email.clone(),
            password: hash_password(&password)?,
            is_admin: true,
        });
        tracing::warn!(email = %email, "Seeded dev-mode administrator");

        Ok((Arc::new(MemorySessionStore::new()), Arc::new(users)))
    }
}

//! storefront-orders server.
//!
//! Loads configuration, prepares the database and serves the REST API until
//! Ctrl+C or SIGTERM.

#![cfg_attr(not(test), forbid(unsafe_code))]

use secrecy::ExposeSecret;
use storefront_orders::auth::TokenService;
use storefront_orders::config::AppConfig;
use storefront_orders::models::NewUser;
use storefront_orders::http::{router, AppState};
use storefront_orders::{db, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(config.log_format);

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");
    db::apply_schema(&pool).await?;

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
    let state = AppState::new(pool, tokens);
    if let Some(admin) = &config.admin {
        let user = state
            .auth()
            .ensure_admin(NewUser {
                name: admin.name.clone(),
                email: admin.email.clone(),
                password: admin.password.expose_secret().to_string(),
            })
            .await?;
        tracing::info!(user_id = %user.id, "Administrator account ready");
    }
    let app = router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("storefront-orders listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

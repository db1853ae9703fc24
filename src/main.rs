use std::sync::Arc;

use projectmatch::app::{build_app, static_pages};
use projectmatch::core::auth::{AuthApiState, AuthService, CookiePolicy, JwtConfig, JwtService};
use projectmatch::core::config::Config;
use projectmatch::core::db::{DbConfig, UserRepository, create_pool_with_migrations};
use tokio::signal::ctrl_c;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("projectmatch=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, jwt_secret={}, production={}",
        config.has_database(),
        config.has_jwt_secret(),
        config.is_production()
    );

    if !config.has_jwt_secret() {
        tracing::error!("JWT_SECRET is not set; logins and registrations will fail");
    }

    let db_config = DbConfig::from_config(&config)?;
    let pool = create_pool_with_migrations(&db_config).await?;

    let auth_service = AuthService::new(
        Arc::new(UserRepository::new(pool)),
        JwtService::new(JwtConfig::from_config(&config)),
    );
    let state = AuthApiState::new(auth_service, CookiePolicy::from_config(&config));

    let app = build_app(state, static_pages(&config.site_root));

    let listener = tokio::net::TcpListener::bind(&config.site_addr).await?;
    tracing::info!("listening on http://{}", &config.site_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

use clap::Parser;
use dotenvy::dotenv;
use line_file_bot::config::BotConfig;
use line_file_bot::infrastructure::{database, storage};
use line_file_bot::services::dispatcher::CommandDispatcher;
use line_file_bot::services::messaging::LineMessagingClient;
use line_file_bot::services::metadata::SeaOrmMetadataStore;
use line_file_bot::services::session::InMemorySessionStore;
use line_file_bot::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the webhook server (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "line_file_bot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting LINE file bot...");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuration error: {}", e);
            return Err(e.into());
        }
    };
    let port = args.port.unwrap_or(config.port);
    info!(
        "🛡️  Config: Bucket={}, Max Content={}MB",
        config.r2_bucket,
        config.max_content_size / 1024 / 1024
    );

    // 2. Infrastructure
    let db = database::setup_database(&config.database_url).await?;
    let storage_service = storage::setup_storage(&config).await;
    let messaging = Arc::new(LineMessagingClient::new(
        config.channel_token.clone(),
        config.line_api_base.clone(),
        config.line_data_api_base.clone(),
    )?);

    // 3. Services
    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::new(SeaOrmMetadataStore::new(db.clone())),
        storage_service.clone(),
        Arc::new(InMemorySessionStore::new()),
        messaging,
        config.max_content_size,
    ));

    let state = AppState {
        db,
        storage: storage_service,
        dispatcher,
        config,
    };

    // 4. Serve
    let app = create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ Webhook listening on: http://0.0.0.0:{}/callback", port);
    info!("📖 Swagger UI documentation: http://localhost:{}/swagger-ui", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Bot exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}

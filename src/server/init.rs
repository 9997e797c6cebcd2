//! Server initialization and main run loop
//!
//! Contains the main `run()` function that starts all server components.

use super::adapters::StoreAuditAdapter;
use super::config::AppConfig;
use super::loader::load_config;
use super::shutdown::cancel_on_signal;
use super::validation::validate_production_config;
use anyhow::{Context, Result};
use axum::{routing::get, Extension, Router};
use nextmonth_core::{SessionAuditStore, SessionRegistry, ShellLauncher, TransportBridge};
use nextmonth_store::WorkspaceStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Shared server components handed to every route
#[derive(Clone)]
pub struct ServerContext {
    pub config: Arc<AppConfig>,
    pub store: Arc<WorkspaceStore>,
    pub registry: Arc<SessionRegistry>,
    pub bridge: TransportBridge,
}

impl ServerContext {
    /// Open the configured database and build the terminal engine
    pub async fn initialize(config: AppConfig) -> Result<Self> {
        let db_path = config.database_path();
        let store = WorkspaceStore::from_path(&db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

        if let Err(e) = store.close_stale_terminal_sessions().await {
            warn!("Failed to close stale terminal sessions: {}", e);
        }

        Self::with_store(config, store)
    }

    /// Build the terminal engine over an already opened store
    pub fn with_store(config: AppConfig, store: WorkspaceStore) -> Result<Self> {
        let store = Arc::new(store);
        let audit: Arc<dyn SessionAuditStore> = Arc::new(StoreAuditAdapter::new(store.clone()));
        let launcher = ShellLauncher::new(config.terminal.shell_config());
        let registry_config = config.terminal.registry_config()?;

        info!(
            shell = %config.terminal.shell,
            cwd = %registry_config.cwd.display(),
            "Terminal engine initialized"
        );

        let registry = Arc::new(SessionRegistry::new(launcher, registry_config, audit));
        let bridge = TransportBridge::new(registry.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            registry,
            bridge,
        })
    }
}

/// Build the main router with all endpoints
pub fn build_router(ctx: &ServerContext) -> Router {
    Router::new()
        .route("/", get(|| async { "NextMonth workspace server" }))
        // Health endpoints (no auth)
        .merge(crate::api::health_routes())
        // OpenAPI document
        .merge(crate::api::docs_routes())
        // REST API
        .merge(crate::api::api_router())
        // WebSocket routes
        .merge(crate::websocket::websocket_router())
        // Layers (applied to all routes)
        .layer(Extension(ctx.config.clone()))
        .layer(Extension(ctx.store.clone()))
        .layer(Extension(ctx.registry.clone()))
        .layer(Extension(ctx.bridge.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve on `listener` until `shutdown` is cancelled.
///
/// On shutdown every remaining shell is killed before connections drain.
pub async fn serve(
    listener: TcpListener,
    ctx: ServerContext,
    shutdown: CancellationToken,
) -> Result<()> {
    let sweeper = ctx.config.terminal.unattached_ttl().map(|ttl| {
        info!(ttl_secs = ttl.as_secs(), "Unattached session expiry enabled");
        ctx.registry.clone().spawn_expiry_sweeper(
            ttl,
            ctx.config.terminal.sweep_interval(),
            shutdown.child_token(),
        )
    });

    let app = build_router(&ctx);
    let registry = ctx.registry.clone();
    let server_shutdown = shutdown.clone();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            server_shutdown.cancelled().await;
            registry.shutdown().await;
        })
        .await
        .context("HTTP server error")?;

    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            warn!("Session sweeper task error: {}", e);
        }
    }

    // Sessions created while connections drained
    ctx.registry.shutdown().await;
    Ok(())
}

/// Run the server
pub async fn run() -> Result<()> {
    info!(
        "Starting NextMonth workspace server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded");

    validate_production_config(&config)?;

    info!("Data directory: {}", config.data_dir().display());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = ServerContext::initialize(config).await?;

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());

    serve(listener, ctx, shutdown).await?;

    info!("NextMonth shutdown complete");
    Ok(())
}

//! Nexus Gateway server binary.
//!
//! Startup order: configuration, logging, storage, event bus, protocol
//! engine, session registry, bootstrap key, HTTP server. On SIGINT/SIGTERM
//! the server stops accepting requests, pending delayed sends are dropped and
//! every live session worker is cancelled.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use sqlx::migrate::Migrator;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nexus_gateway::adapters::engine::HttpProtocolEngine;
use nexus_gateway::adapters::events::{FanoutEventBus, WebhookNotifier};
use nexus_gateway::adapters::http::{build_router, AppState};
use nexus_gateway::adapters::memory::{
    InMemoryApiKeyRepository, InMemoryInstanceRepository, InMemoryMirrorReader,
};
use nexus_gateway::adapters::postgres::{
    PostgresApiKeyRepository, PostgresInstanceRepository, PostgresMirrorReader,
};
use nexus_gateway::application::handlers::{ensure_bootstrap_key, MessageDispatcher};
use nexus_gateway::application::SessionRegistry;
use nexus_gateway::config::{AppConfig, DatabaseConfig};
use nexus_gateway::ports::{
    ApiKeyRepository, EventPublisher, EventSubscriber, InstanceRepository, MirrorReader,
};

const MIGRATIONS_DIR: &str = "./migrations";

struct Storage {
    api_keys: Arc<dyn ApiKeyRepository>,
    instances: Arc<dyn InstanceRepository>,
    mirror: Arc<dyn MirrorReader>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);
    config.validate().context("invalid configuration")?;

    info!(
        environment = ?config.server.environment,
        engine = %config.engine.base_url,
        "Starting nexus-gateway"
    );

    let storage = connect_storage(&config.database).await?;

    let bus = Arc::new(FanoutEventBus::new(config.session.event_queue_capacity));
    if let Some(webhook) = config.webhook.notifier_config() {
        let target = webhook.url.clone();
        let notifier = WebhookNotifier::new(webhook).context("failed to build webhook client")?;
        bus.subscribe(Arc::new(notifier));
        info!(url = %target, "Webhook notifications enabled");
    }

    let engine = HttpProtocolEngine::new(config.engine.sidecar_config())
        .context("failed to build protocol engine client")?;
    let events: Arc<dyn EventPublisher> = bus.clone();
    let registry = SessionRegistry::new(
        Arc::new(engine),
        events,
        config.session.registry_config(),
    );
    let dispatcher = MessageDispatcher::new(registry.clone());

    if let Some(raw) = config.auth.bootstrap_admin_key() {
        let inserted = ensure_bootstrap_key(storage.api_keys.as_ref(), raw)
            .await
            .context("failed to install bootstrap key")?;
        if inserted {
            info!("Bootstrap super admin key installed");
        }
    }

    let state = AppState::new(
        registry.clone(),
        dispatcher.clone(),
        storage.api_keys,
        storage.instances,
        storage.mirror,
    );
    let app = build_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    dispatcher.shutdown();
    registry.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// JSON logs in production, human-readable output otherwise. `RUST_LOG`
/// overrides the configured filter.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

async fn connect_storage(config: &DatabaseConfig) -> anyhow::Result<Storage> {
    let Some(url) = config.url() else {
        warn!("No database URL configured; keys and registrations live in memory only");
        let mirror = Arc::new(InMemoryMirrorReader::new());
        return Ok(Storage {
            api_keys: Arc::new(InMemoryApiKeyRepository::new()),
            instances: Arc::new(InMemoryInstanceRepository::with_mirror(mirror.clone())),
            mirror,
        });
    };

    let pool = config
        .pool_options()
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!(max_connections = config.max_connections, "Connected to PostgreSQL");

    if config.run_migrations {
        Migrator::new(PathBuf::from(MIGRATIONS_DIR))
            .await
            .context("failed to read migrations")?
            .run(&pool)
            .await
            .context("failed to apply migrations")?;
        info!("Database migrations applied");
    }

    Ok(Storage {
        api_keys: Arc::new(PostgresApiKeyRepository::new(pool.clone())),
        instances: Arc::new(PostgresInstanceRepository::new(pool.clone())),
        mirror: Arc::new(PostgresMirrorReader::new(pool)),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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
    info!("Shutdown signal received");
}

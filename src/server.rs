//! HTTP server initialization and runtime setup.
//!
//! Handles the rule store, cache setup, the audit worker, publish triggers
//! and the Axum server lifecycle.

use crate::application::services::RedirectService;
use crate::config::{CacheBackend, Config, RuleSource};
use crate::domain::conditions::ConditionRegistry;
use crate::domain::location::RedirectOptions;
use crate::domain::match_event::MatchEventBus;
use crate::domain::match_worker::run_match_audit;
use crate::domain::repositories::RuleRepository;
use crate::infrastructure::cache::{CacheService, InMemoryCache, NullCache, RedisCache};
use crate::infrastructure::persistence::{JsonRuleRepository, PgRuleRepository};
use crate::routes::{app_router, default_site};
use crate::state::{AppState, PipelineSettings};
use crate::utils::path_normalizer::normalize_base_path;

use anyhow::{Context, Result};
use axum::http::HeaderName;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Rule store (PostgreSQL with migrations, or a JSON file)
/// - Match cache (memory, Redis, or none)
/// - Background match audit worker
/// - Initial publish and the SIGHUP publish trigger
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repository = connect_rule_store(&config).await?;
    let cache = connect_cache(&config).await;

    let events = MatchEventBus::new(config.event_channel_capacity);
    tokio::spawn(run_match_audit(events.subscribe()));
    tracing::info!("Match audit worker started");

    let service = Arc::new(RedirectService::new(
        repository,
        cache,
        ConditionRegistry::with_builtins(),
        config.redirect_conditions.clone(),
        events,
        RedirectOptions {
            preserve_query_string: config.preserve_query_string,
        },
    ));

    // Redirects fail open, so an unreachable store at startup only means
    // nothing redirects until the next successful publish.
    if let Err(e) = service.publish().await {
        tracing::error!(error = %e, "Initial publish failed, serving without rules");
    }

    spawn_reload_listener(service.clone());

    let pipeline = PipelineSettings {
        base_path: normalize_base_path(&config.base_path),
        tester_header: HeaderName::try_from(config.tester_header.as_str())
            .context("TESTER_HEADER is not a valid header name")?,
        tester_header_value: config.tester_header_value.clone(),
    };

    let state = AppState::new(service, pipeline, config.admin_token.clone());
    let app = app_router(state, default_site());

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Opens the configured rule store.
pub async fn connect_rule_store(config: &Config) -> Result<Arc<dyn RuleRepository>> {
    match &config.rule_source {
        RuleSource::Database(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            Ok(Arc::new(PgRuleRepository::new(Arc::new(pool))))
        }
        RuleSource::File(path) => {
            tracing::info!("Loading rules from {}", path.display());
            Ok(Arc::new(JsonRuleRepository::new(path.clone())))
        }
    }
}

/// Builds the configured cache, falling back to no caching when Redis is
/// unreachable.
pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    match (config.cache_backend, &config.redis_url) {
        (CacheBackend::Memory, _) => {
            tracing::info!("Cache enabled (memory)");
            Arc::new(InMemoryCache::new(config.cache_max_entries))
        }
        (CacheBackend::Redis, Some(redis_url)) => {
            match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
                Ok(redis) => {
                    tracing::info!("Cache enabled (Redis)");
                    Arc::new(redis)
                }
                Err(e) => {
                    tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                    Arc::new(NullCache::new())
                }
            }
        }
        _ => {
            tracing::info!("Cache disabled (NullCache)");
            Arc::new(NullCache::new())
        }
    }
}

/// Publishes on every SIGHUP.
#[cfg(unix)]
fn spawn_reload_listener(service: Arc<RedirectService>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "SIGHUP handler unavailable, publish via HTTP only");
            return;
        }
    };

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!("SIGHUP received, publishing rules");
            if let Err(e) = service.publish().await {
                tracing::error!(error = %e, "Publish failed, previous rules stay in effect");
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_listener(_service: Arc<RedirectService>) {}

//! Per-process wiring for a single blade (`spec.md` §4.4), grounded in
//! `blades/__init__.py`'s `start_blade` plus the orchestrator's
//! `on_startup`/`on_cleanup` hooks.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::models::{BladeKind, NodeDescriptor, Topology};
use crate::infrastructure::config::RuntimeSettings;
use crate::infrastructure::database::{DatabaseConnection, SqliteCatalogRepository};
use crate::infrastructure::github::ReleaseHubClient;
use crate::infrastructure::http::{blade_shell, AppState, IntentClient};
use crate::services::{OrchestrationLoop, ResolverRegistry, StaticScraperConfigProvider, VersionCatalog};

fn database_url(node: &NodeDescriptor) -> String {
    let path = node
        .static_cluster_parameters
        .db
        .get("path")
        .and_then(|v| v.as_str())
        .unwrap_or("bladeswarm.db");
    format!("sqlite:{path}")
}

/// Runs this process as `node`'s blade: starts the generic HTTP shell and,
/// for an `orchestrator` node, the background orchestration loop alongside
/// it in the same process (`spec.md` §5).
pub async fn run_blade(
    node: NodeDescriptor,
    topology: Topology,
    settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(node.clone(), topology.clone()));
    let app = blade_shell::router(state);

    let addr = node.host_port();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, blade = %node.blade, "blade HTTP shell listening");

    if node.blade == BladeKind::Orchestrator {
        let orchestration = spawn_orchestration_loop(&node, topology, settings).await?;
        let serve_result = axum::serve(listener, app).await;
        orchestration.stop();
        serve_result?;
    } else {
        axum::serve(listener, app).await?;
    }

    Ok(())
}

async fn spawn_orchestration_loop(
    node: &NodeDescriptor,
    topology: Topology,
    settings: &RuntimeSettings,
) -> anyhow::Result<Arc<OrchestrationLoop>> {
    let db = DatabaseConnection::new(&database_url(node)).await?;
    db.migrate().await?;
    let repository = Arc::new(SqliteCatalogRepository::new(&db));

    let http = reqwest::Client::new();
    let release_hub = ReleaseHubClient::new(http.clone());
    let scraper_config = Arc::new(StaticScraperConfigProvider::new(Vec::new()));

    let catalog = Arc::new(VersionCatalog::new(
        repository,
        release_hub,
        scraper_config,
        node.static_cluster_parameters.github_cache_threshold_minutes,
        settings.sync_semaphore_permits,
    ));
    catalog.set_up().await?;
    if let Err(err) = catalog.sync(true).await {
        tracing::error!(error = %err, "initial version catalog sync failed");
    }

    let resolvers = Arc::new(ResolverRegistry::new(StdRng::from_entropy()));
    let intent_client = Arc::new(IntentClient::new(
        http,
        Duration::from_secs(settings.commit_timeout_seconds),
    ));

    let orchestration = Arc::new(OrchestrationLoop::new(
        catalog,
        resolvers,
        intent_client,
        topology,
        Duration::from_secs_f64(node.static_cluster_parameters.monitor_interval_in_seconds),
        settings.commit_concurrency,
    ));
    orchestration.clone().start();
    Ok(orchestration)
}

//! Orchestration Loop (`spec.md` §4.3), grounded in `orchestrate`/`think`/
//! `commit_intent` in `blades/orchestrator/__init__.py`. Lifecycle follows
//! the teacher's `EventScheduler::start`/`stop` `AtomicBool` + `JoinHandle`
//! pattern in `services/event_scheduler.rs`, replacing the original's
//! `on_startup`/`on_cleanup` aiohttp task with an explicit handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::domain::models::{Capabilities, Intent, Topology};
use crate::infrastructure::http::IntentClient;
use crate::services::resolver_registry::ResolverRegistry;
use crate::services::version_catalog::VersionCatalog;

pub struct OrchestrationLoop {
    catalog: Arc<VersionCatalog>,
    resolvers: Arc<ResolverRegistry>,
    intent_client: Arc<IntentClient>,
    topology: Topology,
    monitor_interval: Duration,
    commit_concurrency: usize,
    running: Arc<AtomicBool>,
}

impl OrchestrationLoop {
    pub fn new(
        catalog: Arc<VersionCatalog>,
        resolvers: Arc<ResolverRegistry>,
        intent_client: Arc<IntentClient>,
        topology: Topology,
        monitor_interval: Duration,
        commit_concurrency: usize,
    ) -> Self {
        Self {
            catalog,
            resolvers,
            intent_client,
            topology,
            monitor_interval,
            commit_concurrency,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Computes the intended configuration of every node in topology order
    /// (`spec.md` §4.3 step 2, "Think").
    pub async fn think(&self) -> Vec<Intent> {
        let versions = match self.catalog.latest_valid_tags().await {
            Ok(versions) => versions,
            Err(err) => {
                tracing::error!(error = %err, "failed to read version catalog; skipping this tick");
                return Vec::new();
            }
        };
        let capabilities: Capabilities = versions
            .into_iter()
            .map(|v| (v.repository_path, v.tag_name))
            .collect();

        let mut intents = Vec::with_capacity(self.topology.blades.len());
        for node in &self.topology.blades {
            match self.resolvers.resolve(node, &capabilities, &self.topology) {
                Ok(intent) => intents.push(intent),
                Err(err) => {
                    tracing::warn!(error = %err, node = %node.name, "resolver failed; skipping node's commit this tick");
                }
            }
        }
        intents
    }

    /// Delivers every intent concurrently, bounded by `commit_concurrency`;
    /// failures are logged and never abort the tick (`spec.md` §4.3 step 3).
    pub async fn commit(&self, intents: Vec<Intent>) {
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.commit_concurrency));
        let tasks = intents.into_iter().map(|intent| {
            let client = self.intent_client.clone();
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                if let Err(err) = client.commit(&intent).await {
                    tracing::warn!(error = %err, host = %intent.host, "could not reach blade");
                }
            }
        });
        join_all(tasks).await;
    }

    /// Runs the think → commit → sleep cycle until `stop` is called.
    /// Mirrors the original's initial `sleep(1)` ("to let the servers set
    /// up") followed by `sleep(monitor_interval - 1)`.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        let loop_ref = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            while loop_ref.running.load(Ordering::SeqCst) {
                tracing::info!("-orchestrate");
                let intents = loop_ref.think().await;
                loop_ref.commit(intents).await;

                let remaining = loop_ref
                    .monitor_interval
                    .saturating_sub(Duration::from_secs(1));
                tokio::time::sleep(remaining).await;
            }
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

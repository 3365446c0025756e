//! Resolver Registry (`spec.md` §4.2), grounded in the `RESOLVERS` dict and
//! `scraping_resolver`/`spotting_resolver`/`orchestrator_resolver` in
//! `blades/orchestrator/__init__.py`.
//!
//! Dispatch is the table form the design notes call out as matching the
//! source literally: a `HashMap<BladeKind, Box<dyn Resolver>>` built once
//! at orchestrator startup.

use std::collections::HashMap;

use rand::Rng;

use crate::domain::errors::ResolverError;
use crate::domain::models::{
    BladeKind, Capabilities, Intent, IntentParams, NodeDescriptor, OrchestratorParams,
    ScraperParams, SpottingParams, Topology,
};

/// Hard-wired scraping module, preserved literally per `spec.md` §9's
/// "not parameterized, since the spec explicitly says not to guess".
const SCRAPING_MODULE: &str = "exorde-labs/rss007d0675444aa13fc";
const BASE_REPOSITORY: &str = "exorde-labs/exorde-swarm-client";
const SCRAPING_KEYWORD: &str = "BITCOIN";

pub trait Resolver: Send + Sync {
    fn resolve(
        &self,
        node: &NodeDescriptor,
        capabilities: &Capabilities,
        topology: &Topology,
    ) -> Result<Intent, ResolverError>;
}

fn capability(capabilities: &Capabilities, key: &str) -> Result<String, ResolverError> {
    capabilities
        .get(key)
        .cloned()
        .ok_or_else(|| ResolverError::MissingCapability(key.to_string()))
}

/// Picks a uniformly random host among the topology's `spotting` blades.
/// Injectable RNG keeps this deterministic in tests (`spec.md` §8 scenario 3).
pub struct ScraperResolver<R: Rng> {
    rng: std::sync::Mutex<R>,
}

impl<R: Rng> ScraperResolver<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: std::sync::Mutex::new(rng),
        }
    }
}

impl<R: Rng + Send> Resolver for ScraperResolver<R> {
    fn resolve(
        &self,
        node: &NodeDescriptor,
        capabilities: &Capabilities,
        topology: &Topology,
    ) -> Result<Intent, ResolverError> {
        let spotting_hosts = topology.hosts_for_kind(BladeKind::Spotting);
        if spotting_hosts.is_empty() {
            return Err(ResolverError::NoSpottingHost);
        }
        let target = {
            let mut rng = self.rng.lock().expect("resolver rng lock poisoned");
            let index = rng.gen_range(0..spotting_hosts.len());
            spotting_hosts[index].clone()
        };

        Ok(Intent {
            host: node.host_port(),
            blade: BladeKind::Scraper,
            version: capability(capabilities, BASE_REPOSITORY)?,
            params: IntentParams::Scraper(ScraperParams {
                keyword: SCRAPING_KEYWORD.to_string(),
                extra_parameters: serde_json::Map::new(),
                target,
                module: SCRAPING_MODULE.to_string(),
                version: capability(capabilities, SCRAPING_MODULE)?,
            }),
        })
    }
}

/// No special behavior on a static topology (`spec.md` §4.2).
pub struct SpottingResolver;

impl Resolver for SpottingResolver {
    fn resolve(
        &self,
        node: &NodeDescriptor,
        capabilities: &Capabilities,
        _topology: &Topology,
    ) -> Result<Intent, ResolverError> {
        Ok(Intent {
            host: node.host_port(),
            blade: BladeKind::Spotting,
            version: capability(capabilities, BASE_REPOSITORY)?,
            params: IntentParams::Spotting(SpottingParams {}),
        })
    }
}

/// No special behavior on a static topology (`spec.md` §4.2).
pub struct OrchestratorResolver;

impl Resolver for OrchestratorResolver {
    fn resolve(
        &self,
        node: &NodeDescriptor,
        capabilities: &Capabilities,
        _topology: &Topology,
    ) -> Result<Intent, ResolverError> {
        Ok(Intent {
            host: node.host_port(),
            blade: BladeKind::Orchestrator,
            version: capability(capabilities, BASE_REPOSITORY)?,
            params: IntentParams::Orchestrator(OrchestratorParams {}),
        })
    }
}

pub struct ResolverRegistry {
    resolvers: HashMap<BladeKind, Box<dyn Resolver>>,
}

impl ResolverRegistry {
    pub fn new<R: Rng + Send + 'static>(rng: R) -> Self {
        let mut resolvers: HashMap<BladeKind, Box<dyn Resolver>> = HashMap::new();
        resolvers.insert(BladeKind::Scraper, Box::new(ScraperResolver::new(rng)));
        resolvers.insert(BladeKind::Spotting, Box::new(SpottingResolver));
        resolvers.insert(BladeKind::Orchestrator, Box::new(OrchestratorResolver));
        Self { resolvers }
    }

    pub fn resolve(
        &self,
        node: &NodeDescriptor,
        capabilities: &Capabilities,
        topology: &Topology,
    ) -> Result<Intent, ResolverError> {
        let resolver = self
            .resolvers
            .get(&node.blade)
            .ok_or_else(|| ResolverError::UnknownKind(node.blade.to_string()))?;
        resolver.resolve(node, capabilities, topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::StaticClusterParameters;
    use rand::rngs::mock::StepRng;

    fn node(name: &str, kind: BladeKind, host: &str, port: u16) -> NodeDescriptor {
        NodeDescriptor {
            name: name.to_string(),
            blade: kind,
            managed: false,
            host: host.to_string(),
            port,
            venv: String::new(),
            static_cluster_parameters: StaticClusterParameters {
                monitor_interval_in_seconds: 30.0,
                database_provider: "sqlite".to_string(),
                db: serde_json::json!({}),
                github_cache_threshold_minutes: 10,
            },
        }
    }

    #[test]
    fn scraper_resolver_picks_first_spotting_host_with_fixed_seed() {
        let spotting_a = node("spotting_a", BladeKind::Spotting, "10.0.0.1", 9000);
        let spotting_b = node("spotting_b", BladeKind::Spotting, "10.0.0.2", 9000);
        let scraper = node("scraper_a", BladeKind::Scraper, "10.0.0.3", 9100);
        let topology = Topology {
            blades: vec![spotting_a, spotting_b, scraper.clone()],
        };

        let mut capabilities = Capabilities::new();
        capabilities.insert(BASE_REPOSITORY.to_string(), "1.0.0".to_string());
        capabilities.insert(SCRAPING_MODULE.to_string(), "2.0.0".to_string());

        // StepRng always yields 0 from gen_range(0..n) for n=2, selecting index 0.
        let registry = ResolverRegistry::new(StepRng::new(0, 0));
        let intent = registry.resolve(&scraper, &capabilities, &topology).unwrap();

        assert_eq!(intent.host, "10.0.0.3:9100");
        match intent.params {
            IntentParams::Scraper(params) => {
                assert_eq!(params.target, "10.0.0.1:9000");
                assert_eq!(params.module, SCRAPING_MODULE);
            }
            _ => panic!("expected scraper params"),
        }
    }

    #[test]
    fn scraper_resolver_fails_without_spotting_host() {
        let scraper = node("scraper_a", BladeKind::Scraper, "10.0.0.3", 9100);
        let topology = Topology {
            blades: vec![scraper.clone()],
        };
        let mut capabilities = Capabilities::new();
        capabilities.insert(BASE_REPOSITORY.to_string(), "1.0.0".to_string());

        let registry = ResolverRegistry::new(StepRng::new(0, 0));
        let err = registry.resolve(&scraper, &capabilities, &topology).unwrap_err();
        assert_eq!(err, ResolverError::NoSpottingHost);
    }

    #[test]
    fn missing_capability_is_reported() {
        let scraper = node("scraper_a", BladeKind::Scraper, "10.0.0.3", 9100);
        let spotting = node("spotting_a", BladeKind::Spotting, "10.0.0.1", 9000);
        let topology = Topology {
            blades: vec![scraper.clone(), spotting],
        };
        let capabilities = Capabilities::new();

        let registry = ResolverRegistry::new(StepRng::new(0, 0));
        let err = registry.resolve(&scraper, &capabilities, &topology).unwrap_err();
        assert_eq!(err, ResolverError::MissingCapability(BASE_REPOSITORY.to_string()));
    }
}

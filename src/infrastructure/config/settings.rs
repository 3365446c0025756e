//! Ambient runtime settings, layered over the static `Topology`
//! (`SPEC_FULL.md` §2), following the teacher's `ConfigLoader` merge order.

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Timeout for a single intent-commit POST, in seconds.
    pub commit_timeout_seconds: u64,
    /// Concurrency cap on in-flight intent commits per tick.
    pub commit_concurrency: usize,
    /// Permits on the version catalog's sync semaphore (§5: always 1).
    pub sync_semaphore_permits: usize,
    /// Delay before respawning an exited managed child, in seconds.
    pub respawn_delay_seconds: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            commit_timeout_seconds: 10,
            commit_concurrency: 16,
            sync_semaphore_permits: 1,
            respawn_delay_seconds: 1,
        }
    }
}

impl RuntimeSettings {
    /// Loads defaults, an optional `bladeswarm.yaml`, then `BLADESWARM_*`
    /// environment overrides, in ascending precedence.
    pub fn load() -> anyhow::Result<Self> {
        let settings: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file("bladeswarm.yaml"))
            .merge(Env::prefixed("BLADESWARM_"))
            .extract()?;
        Ok(settings)
    }
}

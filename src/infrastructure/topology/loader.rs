//! Static topology loader (`spec.md` §4.6), grounded in `load_config` /
//! the `__main__` post-load checks of `multi.py`.

use std::collections::HashSet;
use std::path::Path;

use crate::domain::errors::ConfigError;
use crate::domain::models::Topology;

pub struct TopologyLoader;

impl TopologyLoader {
    /// Parses and validates the topology file at `path`. The file is read
    /// exactly once; the result is never reloaded for the life of the
    /// process (`spec.md` §3 "Lifecycle").
    pub fn load(path: impl AsRef<Path>) -> Result<Topology, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        let topology: Topology = serde_yaml::from_str(&raw)?;
        Self::validate(&topology)?;
        Ok(topology)
    }

    fn validate(topology: &Topology) -> Result<(), ConfigError> {
        if topology.blades.is_empty() {
            return Err(ConfigError::EmptyTopology);
        }

        let mut seen = HashSet::new();
        for blade in &topology.blades {
            if blade.name.is_empty() {
                return Err(ConfigError::MissingField("name"));
            }
            if blade.host.is_empty() {
                return Err(ConfigError::MissingField("host"));
            }
            if !seen.insert(blade.name.clone()) {
                return Err(ConfigError::DuplicateName(blade.name.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_topology(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn rejects_missing_file() {
        let err = TopologyLoader::load("/nonexistent/topology.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn rejects_empty_blade_list() {
        let file = write_topology("blades: []\n");
        let err = TopologyLoader::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTopology));
    }

    #[test]
    fn rejects_duplicate_names() {
        let file = write_topology(
            r"
blades:
  - name: a
    blade: orchestrator
    managed: false
    host: 127.0.0.1
    port: 9000
    venv: ""
    static_cluster_parameters:
      monitor_interval_in_seconds: 30.0
      database_provider: sqlite
      db: {}
  - name: a
    blade: scraper
    managed: false
    host: 127.0.0.1
    port: 9001
    venv: ""
    static_cluster_parameters:
      monitor_interval_in_seconds: 30.0
      database_provider: sqlite
      db: {}
",
        );
        let err = TopologyLoader::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(_)));
    }

    #[test]
    fn parses_a_valid_topology() {
        let file = write_topology(
            r"
blades:
  - name: orch
    blade: orchestrator
    managed: false
    host: 127.0.0.1
    port: 9000
    venv: ""
    static_cluster_parameters:
      monitor_interval_in_seconds: 30.0
      database_provider: sqlite
      db: {}
      github_cache_threshold_minutes: 10
",
        );
        let topology = TopologyLoader::load(file.path()).unwrap();
        assert_eq!(topology.blades.len(), 1);
        assert_eq!(topology.blades[0].name, "orch");
    }
}

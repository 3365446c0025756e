//! Core data model (`spec.md` §3).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The static, process-start configuration enumerating every blade of the
/// cluster. Loaded once and never reloaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topology {
    pub blades: Vec<NodeDescriptor>,
}

impl Topology {
    /// All `host:port` strings for blades of the given kind, in topology order.
    pub fn hosts_for_kind(&self, kind: BladeKind) -> Vec<String> {
        self.blades
            .iter()
            .filter(|b| b.blade == kind)
            .map(NodeDescriptor::host_port)
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&NodeDescriptor> {
        self.blades.iter().find(|b| b.name == name)
    }
}

/// One blade's entry in the topology.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDescriptor {
    pub name: String,
    pub blade: BladeKind,
    #[serde(default)]
    pub managed: bool,
    pub host: String,
    pub port: u16,
    /// Path for the isolated execution environment, required for managed nodes.
    #[serde(default)]
    pub venv: String,
    pub static_cluster_parameters: StaticClusterParameters,
}

impl NodeDescriptor {
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaticClusterParameters {
    pub monitor_interval_in_seconds: f64,
    pub database_provider: String,
    pub db: serde_json::Value,
    #[serde(default = "default_github_cache_threshold_minutes")]
    pub github_cache_threshold_minutes: u32,
}

const fn default_github_cache_threshold_minutes() -> u32 {
    10
}

/// The role of a blade. One of `scraper`, `spotting`, `orchestrator`, `monitor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BladeKind {
    Scraper,
    Spotting,
    Orchestrator,
    Monitor,
}

impl BladeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scraper => "scraper",
            Self::Spotting => "spotting",
            Self::Orchestrator => "orchestrator",
            Self::Monitor => "monitor",
        }
    }
}

impl fmt::Display for BladeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BladeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scraper" => Ok(Self::Scraper),
            "spotting" => Ok(Self::Spotting),
            "orchestrator" => Ok(Self::Orchestrator),
            "monitor" => Ok(Self::Monitor),
            other => Err(format!("unknown blade kind `{other}`")),
        }
    }
}

/// A repository tracked by the version catalog, identified by `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Repository {
    pub id: i64,
    pub path: String,
    pub last_online_retrieval: chrono::NaiveDateTime,
}

/// One release tag of a tracked repository.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub repository: i64,
    pub name: String,
    pub zipball_url: String,
    pub tarball_url: String,
    pub _commit: String,
    /// Stored for parity with the release hub's payload; never read back out.
    pub node_id: String,
}

/// A tag fetched from the release hub, prior to being stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTag {
    pub name: String,
    pub zipball_url: String,
    pub tarball_url: String,
    pub commit_url: String,
    /// Not persisted; kept for parity with the upstream payload shape.
    pub node_id: String,
}

/// A label excluding a tag from "latest valid" selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Defective,
}

impl MarkKind {
    pub const fn db_value(self) -> i64 {
        match self {
            Self::Defective => 0,
        }
    }
}

/// The selected usable version of a repository at a moment in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryVersion {
    pub repository_path: String,
    pub tag_name: String,
}

/// A mapping `repository_path -> tag_name`, derived from the catalog at the
/// moment of orchestration.
pub type Capabilities = HashMap<String, String>;

/// The declarative message describing what a blade should be doing right now.
///
/// `Deserialize` is implemented by hand rather than derived: `params`'s
/// shape depends on the sibling `blade` field, which an untagged enum over
/// `IntentParams` alone cannot see (`Spotting` and `Orchestrator` both
/// serialize to `{}`, so probing `params` in isolation cannot tell them
/// apart).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Intent {
    pub host: String,
    pub blade: BladeKind,
    pub version: String,
    pub params: IntentParams,
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawIntent {
            host: String,
            blade: BladeKind,
            version: String,
            params: serde_json::Value,
        }

        let raw = RawIntent::deserialize(deserializer)?;
        let params = match raw.blade {
            BladeKind::Scraper => IntentParams::Scraper(
                serde_json::from_value(raw.params).map_err(serde::de::Error::custom)?,
            ),
            BladeKind::Spotting => IntentParams::Spotting(
                serde_json::from_value(raw.params).map_err(serde::de::Error::custom)?,
            ),
            BladeKind::Orchestrator => IntentParams::Orchestrator(
                serde_json::from_value(raw.params).map_err(serde::de::Error::custom)?,
            ),
            BladeKind::Monitor => {
                return Err(serde::de::Error::custom(
                    "monitor blades do not receive intents",
                ))
            }
        };

        Ok(Self {
            host: raw.host,
            blade: raw.blade,
            version: raw.version,
            params,
        })
    }
}

/// Wire shape of `Intent::params`. Never deserialized on its own — see
/// `Intent`'s hand-written `Deserialize` impl, which dispatches on `blade`
/// before reaching this type.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum IntentParams {
    Scraper(ScraperParams),
    Spotting(SpottingParams),
    Orchestrator(OrchestratorParams),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScraperParams {
    pub keyword: String,
    pub extra_parameters: serde_json::Map<String, serde_json::Value>,
    pub target: String,
    pub module: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SpottingParams {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OrchestratorParams {}

/// A value in a blade's `GET /` state snapshot. Mirrors `app_serializer` in
/// `blades/__init__.py`: values the serializer can't handle fall back to a
/// stringified form rather than failing the endpoint.
#[derive(Debug, Clone)]
pub enum StateValue {
    Json(serde_json::Value),
    /// The Rust analogue of "Callable: `<name>`" / "Unnamed callable".
    Opaque(String),
}

impl StateValue {
    pub fn callable(name: Option<&str>) -> Self {
        match name {
            Some(n) => Self::Opaque(format!("Callable: {n}")),
            None => Self::Opaque("Unnamed callable".to_string()),
        }
    }
}

impl Serialize for StateValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Json(v) => v.serialize(serializer),
            Self::Opaque(s) => s.serialize(serializer),
        }
    }
}

/// The full JSON snapshot served by `GET /` (`spec.md` §4.4).
#[derive(Debug, Clone, Serialize)]
pub struct BladeState {
    pub blade: NodeDescriptor,
    pub topology: Topology,
    #[serde(flatten)]
    pub extra: BTreeMap<String, StateValue>,
}

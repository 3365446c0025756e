//! Domain error taxonomy for the swarm control plane (`spec.md` §7).

use thiserror::Error;

/// Errors raised while loading and validating the static topology.
///
/// Always fatal at the point the supervisor or a blade process starts up.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("topology file not found at {0}")]
    NotFound(String),

    #[error("failed to parse topology yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("topology has no blades")]
    EmptyTopology,

    #[error("blade entry missing required field `{0}`")]
    MissingField(&'static str),

    #[error("duplicate blade name `{0}`")]
    DuplicateName(String),

    #[error("no blade named `{0}` in topology")]
    UnknownBlade(String),
}

/// Errors raised by the version catalog (`spec.md` §4.1, §7).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("tag `{tag}` not found for repository `{repository}`")]
    NotFound { repository: String, tag: String },

    #[error("failed to fetch tags for `{repository}`: {source}")]
    UpstreamFetch {
        repository: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to retrieve external scraper configuration: {0}")]
    ScraperConfigUnavailable(anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors raised while resolving a node's intent (`spec.md` §4.2, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("capability `{0}` missing from the capabilities map")]
    MissingCapability(String),

    #[error("no spotting host present in topology")]
    NoSpottingHost,

    #[error("no resolver registered for blade kind `{0}`")]
    UnknownKind(String),
}

/// Errors raised while delivering an intent to a peer (`spec.md` §4.3, §7).
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("could not reach {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{host} responded with non-2xx status {status}")]
    NonSuccessStatus { host: String, status: u16 },
}

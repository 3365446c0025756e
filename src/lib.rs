//! Bladeswarm - cluster control plane for a swarm of scraping/spotting
//! blades.
//!
//! - Version Catalog: cached release-tag store with defect marks.
//! - Resolver Registry: pure mapping from blade kind to intent.
//! - Orchestration Loop: periodic think/commit reconciliation.
//! - Blade HTTP Shell: generic status/intent endpoints shared by every kind.
//! - Supervisor: keeps managed child processes alive in isolated sandboxes.
//! - Topology Loader: parses the static cluster file.

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use infrastructure::database::DatabaseConnection;

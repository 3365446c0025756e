pub mod release_hub_client;

pub use release_hub_client::ReleaseHubClient;

//! Release-hub HTTP client (`spec.md` §6): `GET /repos/{owner}/{name}/tags`.

use serde::Deserialize;

use crate::domain::models::FetchedTag;
use crate::domain::ports::is_prerelease;

#[derive(Debug, Deserialize)]
struct RawCommit {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    name: String,
    zipball_url: String,
    tarball_url: String,
    commit: RawCommit,
    node_id: String,
}

pub struct ReleaseHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReleaseHubClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: "https://api.github.com".to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Fetches tags for `owner/name`, filtering pre-releases client-side
    /// (`spec.md` §3, §6).
    pub async fn fetch_tags(&self, repository_path: &str) -> anyhow::Result<Vec<FetchedTag>> {
        let url = format!("{}/repos/{repository_path}/tags", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, "bladeswarm")
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "release hub returned non-2xx status {} for {repository_path}",
                response.status()
            );
        }

        let raw: Vec<RawTag> = response.json().await?;
        Ok(raw
            .into_iter()
            .filter(|t| !is_prerelease(&t.name))
            .map(|t| FetchedTag {
                name: t.name,
                zipball_url: t.zipball_url,
                tarball_url: t.tarball_url,
                commit_url: t.commit.url,
                node_id: t.node_id,
            })
            .collect())
    }
}

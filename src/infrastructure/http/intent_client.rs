//! Intent delivery client (`spec.md` §4.3, §6): `POST http://{host}:{port}/`.

use std::time::Duration;

use crate::domain::errors::CommitError;
use crate::domain::models::Intent;

pub struct IntentClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl IntentClient {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Delivers `intent` to its target blade. Timeouts, connection refusal,
    /// and non-2xx responses are all `CommitError::Transport` /
    /// `NonSuccessStatus` — the orchestration tick logs and continues
    /// regardless of which one is returned (`spec.md` §4.3, §7).
    pub async fn commit(&self, intent: &Intent) -> Result<(), CommitError> {
        let url = format!("http://{}/", intent.host);
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(intent)
            .send()
            .await
            .map_err(|source| CommitError::Transport {
                host: intent.host.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CommitError::NonSuccessStatus {
                host: intent.host.clone(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

//! Version Catalog (`spec.md` §4.1), grounded in
//! `versioning.py`'s `VersionManager`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;

use crate::domain::errors::CatalogError;
use crate::domain::models::{MarkKind, RepositoryVersion};
use crate::domain::ports::{latest_per_repository, CatalogRepository, ScraperConfigProvider};
use crate::infrastructure::github::ReleaseHubClient;

/// Always tracked first, ahead of the externally configured module list
/// (`spec.md` §4.1, preserved for deterministic logging as in the source).
const BASE_REPOSITORY: &str = "exorde-labs/exorde-swarm-client";

pub struct VersionCatalog {
    repository: Arc<dyn CatalogRepository>,
    release_hub: ReleaseHubClient,
    scraper_config: Arc<dyn ScraperConfigProvider>,
    /// `sync` calls against the upstream hub are serialized; the catalog
    /// itself assumes a single orchestrator caller (`spec.md` §5).
    sync_semaphore: Semaphore,
    cache_threshold_minutes: u32,
}

impl VersionCatalog {
    pub fn new(
        repository: Arc<dyn CatalogRepository>,
        release_hub: ReleaseHubClient,
        scraper_config: Arc<dyn ScraperConfigProvider>,
        cache_threshold_minutes: u32,
        sync_semaphore_permits: usize,
    ) -> Self {
        Self {
            repository,
            release_hub,
            scraper_config,
            sync_semaphore: Semaphore::new(sync_semaphore_permits),
            cache_threshold_minutes,
        }
    }

    pub async fn set_up(&self) -> Result<(), CatalogError> {
        self.repository.set_up().await
    }

    /// Refreshes tags for the tracked repository set.
    ///
    /// If `use_cache` is true, only repositories whose
    /// `last_online_retrieval` predates the cache threshold are refetched.
    /// If retrieving the external scraper configuration fails, sync aborts
    /// with a logged warning and the catalog is left untouched.
    pub async fn sync(&self, use_cache: bool) -> Result<(), CatalogError> {
        let _permit = self.sync_semaphore.acquire().await.expect("semaphore never closed");

        let mut repositories = vec![BASE_REPOSITORY.to_string()];
        match self.scraper_config.module_list().await {
            Ok(modules) => repositories.extend(modules),
            Err(err) => {
                tracing::warn!(error = %err, "failed to retrieve scraper configuration; sync aborted");
                return Ok(());
            }
        }

        let repositories_to_sync = if use_cache {
            let threshold = Utc::now().naive_utc()
                - chrono::Duration::minutes(i64::from(self.cache_threshold_minutes));
            let stale: std::collections::HashSet<String> = self
                .repository
                .repositories_older_than(threshold)
                .await?
                .into_iter()
                .collect();
            repositories
                .into_iter()
                .filter(|r| stale.contains(r))
                .collect::<Vec<_>>()
        } else {
            repositories
        };

        tracing::info!(count = repositories_to_sync.len(), "syncing repositories");

        for (i, repository_path) in repositories_to_sync.iter().enumerate() {
            match self.release_hub.fetch_tags(repository_path).await {
                Ok(tags) => {
                    if let Err(err) = self.repository.insert_tags(repository_path, &tags).await {
                        tracing::error!(error = %err, repository = %repository_path, "failed to persist tags");
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        repository = %repository_path,
                        "failed to fetch tags; leaving catalog untouched for this repository"
                    );
                }
            }

            if i + 1 < repositories_to_sync.len() {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        Ok(())
    }

    /// The semver-maximum non-DEFECTIVE tag per tracked repository.
    pub async fn latest_valid_tags(&self) -> Result<Vec<RepositoryVersion>, CatalogError> {
        let rows = self
            .repository
            .tags_without_mark(MarkKind::Defective)
            .await?
            .into_iter()
            .map(|(path, tag)| (path, tag.name))
            .collect();
        Ok(latest_per_repository(rows))
    }

    pub async fn mark_tag(
        &self,
        repository_path: &str,
        tag_name: &str,
        mark: MarkKind,
    ) -> Result<(), CatalogError> {
        let tag = self
            .repository
            .find_tag(repository_path, tag_name)
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                repository: repository_path.to_string(),
                tag: tag_name.to_string(),
            })?;
        self.repository.mark_tag(tag.id, mark).await
    }

    pub async fn unmark_tag(
        &self,
        repository_path: &str,
        tag_name: &str,
        mark: MarkKind,
    ) -> Result<(), CatalogError> {
        let tag = self
            .repository
            .find_tag(repository_path, tag_name)
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                repository: repository_path.to_string(),
                tag: tag_name.to_string(),
            })?;
        self.repository.unmark_tag(tag.id, mark).await
    }
}

//! Trait boundaries ("ports") between the domain/services layer and
//! infrastructure, following the teacher's repository-pattern style
//! (`domain/ports.rs` in `odgrim-abathur-swarm`).

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::errors::CatalogError;
use super::models::{FetchedTag, MarkKind, Repository, RepositoryVersion, Tag};

/// Persistence boundary for the version catalog (`spec.md` §4.1, §6).
///
/// Implemented against an embedded SQL engine (`sqlx` + SQLite) in
/// `infrastructure::database::catalog_repo`.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Idempotently create the `repositories`, `tags`, and `marks` tables.
    async fn set_up(&self) -> Result<(), CatalogError>;

    /// Upsert a repository by path, refreshing `last_online_retrieval` to now.
    async fn upsert_repository(&self, path: &str) -> Result<Repository, CatalogError>;

    /// Repositories whose `last_online_retrieval` is older than `threshold`.
    async fn repositories_older_than(
        &self,
        threshold: NaiveDateTime,
    ) -> Result<Vec<String>, CatalogError>;

    async fn all_repository_paths(&self) -> Result<Vec<String>, CatalogError>;

    /// Insert tags for a repository, ignoring conflicts on `(repository, name)`.
    async fn insert_tags(
        &self,
        repository_path: &str,
        tags: &[FetchedTag],
    ) -> Result<(), CatalogError>;

    /// Every `(repository_path, tag)` pair not carrying `mark`.
    async fn tags_without_mark(&self, mark: MarkKind) -> Result<Vec<(String, Tag)>, CatalogError>;

    async fn find_tag(
        &self,
        repository_path: &str,
        tag_name: &str,
    ) -> Result<Option<Tag>, CatalogError>;

    async fn mark_tag(&self, tag_id: i64, mark: MarkKind) -> Result<(), CatalogError>;

    async fn unmark_tag(&self, tag_id: i64, mark: MarkKind) -> Result<(), CatalogError>;
}

/// External collaborator contract for the scraper business configuration
/// (`spec.md` §1 Out of scope, §4.1). The version catalog only needs the
/// set of scraping-module repositories it must track.
#[async_trait]
pub trait ScraperConfigProvider: Send + Sync {
    async fn module_list(&self) -> anyhow::Result<Vec<String>>;
}

/// A pure function of `(repository_path, tag_name)` pairs into the
/// semver-maximum tag per repository, excluding anything that fails to
/// parse (`spec.md` §3, §9).
pub fn latest_per_repository(
    rows: Vec<(String, String)>,
) -> Vec<RepositoryVersion> {
    use std::collections::HashMap;

    let mut by_repo: HashMap<String, Vec<String>> = HashMap::new();
    for (repo, tag) in rows {
        by_repo.entry(repo).or_default().push(tag);
    }

    let mut out = Vec::new();
    for (repository_path, tags) in by_repo {
        if let Some(tag_name) = max_semver(&tags) {
            out.push(RepositoryVersion {
                repository_path,
                tag_name,
            });
        }
    }
    out
}

/// Returns the semver-maximum of `tags`, logging and excluding any tag name
/// that doesn't parse as semver (`spec.md` §3: "untyped versions ... MUST
/// treat parse failure as excluded from latest selection and log").
pub fn max_semver(tags: &[String]) -> Option<String> {
    tags.iter()
        .filter_map(|name| match parse_semver(name) {
            Some(v) => Some((v, name.clone())),
            None => {
                tracing::warn!(tag = %name, "tag name does not parse as semver; excluded from latest selection");
                None
            }
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, name)| name)
}

/// Parses a tag name as semver, tolerating a leading `v` (e.g. `v1.2.0`).
pub fn parse_semver(name: &str) -> Option<semver::Version> {
    let stripped = name.strip_prefix('v').unwrap_or(name);
    semver::Version::parse(stripped).ok()
}

/// `true` if a raw tag name (as returned by the release hub) denotes a
/// pre-release, which is discarded at ingestion (`spec.md` §3).
pub fn is_prerelease(name: &str) -> bool {
    parse_semver(name).is_some_and(|v| !v.pre.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prerelease_detection() {
        assert!(is_prerelease("2.0.0-rc1"));
        assert!(!is_prerelease("2.0.0"));
        // Unparseable names are not flagged as prerelease; they are simply
        // excluded from max selection elsewhere.
        assert!(!is_prerelease("not-a-version"));
    }

    #[test]
    fn latest_selection_excludes_unparseable() {
        let versions = max_semver(&[
            "1.2.0".to_string(),
            "2.0.0".to_string(),
            "not-a-version".to_string(),
        ]);
        assert_eq!(versions, Some("2.0.0".to_string()));
    }

    #[test]
    fn latest_per_repository_groups_and_selects_max() {
        let rows = vec![
            ("x/y".to_string(), "1.2.0".to_string()),
            ("x/y".to_string(), "2.0.0".to_string()),
            ("a/b".to_string(), "0.1.0".to_string()),
        ];
        let mut result = latest_per_repository(rows);
        result.sort_by(|a, b| a.repository_path.cmp(&b.repository_path));
        assert_eq!(
            result,
            vec![
                RepositoryVersion {
                    repository_path: "a/b".to_string(),
                    tag_name: "0.1.0".to_string()
                },
                RepositoryVersion {
                    repository_path: "x/y".to_string(),
                    tag_name: "2.0.0".to_string()
                },
            ]
        );
    }
}

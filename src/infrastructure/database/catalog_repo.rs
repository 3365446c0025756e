//! `SQLite`-backed `CatalogRepository` (`spec.md` §4.1, §6).

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::CatalogError;
use crate::domain::models::{FetchedTag, MarkKind, Repository, Tag};
use crate::domain::ports::CatalogRepository;

use super::connection::DatabaseConnection;

pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    pub fn new(connection: &DatabaseConnection) -> Self {
        Self {
            pool: connection.pool().clone(),
        }
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn set_up(&self) -> Result<(), CatalogError> {
        // Migrations already create the tables; this exists so callers don't
        // need to know whether the schema is managed by migrations or not.
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_repository(&self, path: &str) -> Result<Repository, CatalogError> {
        let now = Utc::now().naive_utc();
        sqlx::query_as::<_, Repository>(
            r"
            INSERT INTO repositories (path, last_online_retrieval)
            VALUES (?1, ?2)
            ON CONFLICT(path) DO UPDATE SET last_online_retrieval = excluded.last_online_retrieval
            RETURNING id, path, last_online_retrieval
            ",
        )
        .bind(path)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(CatalogError::from)
    }

    async fn repositories_older_than(
        &self,
        threshold: NaiveDateTime,
    ) -> Result<Vec<String>, CatalogError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT path FROM repositories WHERE last_online_retrieval < ?1",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(p,)| p).collect())
    }

    async fn all_repository_paths(&self) -> Result<Vec<String>, CatalogError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT path FROM repositories")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(p,)| p).collect())
    }

    async fn insert_tags(
        &self,
        repository_path: &str,
        tags: &[FetchedTag],
    ) -> Result<(), CatalogError> {
        let repository = self.upsert_repository(repository_path).await?;
        for tag in tags {
            sqlx::query(
                r"
                INSERT INTO tags (repository, name, zipball_url, tarball_url, _commit, node_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(repository, name) DO NOTHING
                ",
            )
            .bind(repository.id)
            .bind(&tag.name)
            .bind(&tag.zipball_url)
            .bind(&tag.tarball_url)
            .bind(&tag.commit_url)
            .bind(&tag.node_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn tags_without_mark(&self, mark: MarkKind) -> Result<Vec<(String, Tag)>, CatalogError> {
        let rows = sqlx::query_as::<_, (String, i64, i64, String, String, String, String, String)>(
            r"
            SELECT r.path, t.id, t.repository, t.name, t.zipball_url, t.tarball_url, t._commit, t.node_id
            FROM tags t
            JOIN repositories r ON r.id = t.repository
            WHERE t.id NOT IN (
                SELECT tag_id FROM marks WHERE mark = ?1
            )
            ",
        )
        .bind(mark.db_value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(path, id, repository, name, zipball_url, tarball_url, _commit, node_id)| {
                (
                    path,
                    Tag {
                        id,
                        repository,
                        name,
                        zipball_url,
                        tarball_url,
                        _commit,
                        node_id,
                    },
                )
            })
            .collect())
    }

    async fn find_tag(
        &self,
        repository_path: &str,
        tag_name: &str,
    ) -> Result<Option<Tag>, CatalogError> {
        sqlx::query_as::<_, Tag>(
            r"
            SELECT t.id, t.repository, t.name, t.zipball_url, t.tarball_url, t._commit, t.node_id
            FROM tags t
            JOIN repositories r ON r.id = t.repository
            WHERE r.path = ?1 AND t.name = ?2
            ",
        )
        .bind(repository_path)
        .bind(tag_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(CatalogError::from)
    }

    async fn mark_tag(&self, tag_id: i64, mark: MarkKind) -> Result<(), CatalogError> {
        sqlx::query("INSERT INTO marks (tag_id, mark) VALUES (?1, ?2) ON CONFLICT(tag_id, mark) DO NOTHING")
            .bind(tag_id)
            .bind(mark.db_value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn unmark_tag(&self, tag_id: i64, mark: MarkKind) -> Result<(), CatalogError> {
        sqlx::query("DELETE FROM marks WHERE tag_id = ?1 AND mark = ?2")
            .bind(tag_id)
            .bind(mark.db_value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

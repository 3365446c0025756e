use bladeswarm::infrastructure::database::{DatabaseConnection, SqliteCatalogRepository};

/// Opens an in-memory `SQLite` database with migrations applied, matching
/// what `Supervisor`/`run_blade` do for an on-disk database at startup.
#[allow(dead_code)]
pub async fn catalog_repository() -> (DatabaseConnection, SqliteCatalogRepository) {
    let db = DatabaseConnection::new("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    db.migrate().await.expect("failed to run migrations");
    let repo = SqliteCatalogRepository::new(&db);
    (db, repo)
}

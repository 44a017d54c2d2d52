//! Integration tests for schema initialization using in-memory SurrealDB.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[derive(Debug, Deserialize)]
struct MigrationRow {
    version: u32,
}

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    altar_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: surrealdb::Value = result.take(0).unwrap();
    let info_str = format!("{info:?}");

    for table in [
        "super_admin",
        "wedding_admin",
        "legacy_admin",
        "wedding",
        "wedding_slug",
        "wedding_admin_link",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    altar_db::run_migrations(&db).await.unwrap();
    altar_db::run_migrations(&db).await.unwrap();

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version ASC")
        .await
        .unwrap();
    let records: Vec<MigrationRow> = result.take(0).unwrap();
    let versions: Vec<u32> = records.into_iter().map(|r| r.version).collect();
    assert_eq!(versions, (1..=altar_db::latest_version()).collect::<Vec<_>>());
}

#[tokio::test]
async fn wedding_status_is_constrained() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    altar_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE wedding SET \
             slug = 'anna-and-ben', display_name = 'Anna & Ben', \
             status = 'deleted', owner_id = 'anna', co_owner_ids = [], \
             created_at = 0, created_by = 'master'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "unknown status should be rejected");
}

#[tokio::test]
async fn unique_index_prevents_duplicate_slugs() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    altar_db::run_migrations(&db).await.unwrap();

    let create = "CREATE wedding SET \
                  slug = 'anna-and-ben', display_name = 'Anna & Ben', \
                  status = 'draft', owner_id = 'anna', co_owner_ids = [], \
                  created_at = 0, created_by = 'master'";

    db.query(create).await.unwrap().check().unwrap();
    let result = db.query(create).await.unwrap().check();

    assert!(result.is_err(), "duplicate slug should be rejected");
}

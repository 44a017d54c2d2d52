//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings, timestamps as epoch milliseconds, and
//! enums as strings with ASSERT constraints. Account records are keyed by
//! normalized username so that `CREATE` on an existing key fails.

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, Deserialize)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "accounts",
        sql: SCHEMA_V1_ACCOUNTS,
    },
    Migration {
        version: 2,
        name: "weddings",
        sql: SCHEMA_V2_WEDDINGS,
    },
];

// -----------------------------------------------------------------------
// v1: account namespaces
// -----------------------------------------------------------------------

const SCHEMA_V1_ACCOUNTS: &str = "\
-- =======================================================================
-- Super-admins (record id = username)
-- =======================================================================
DEFINE TABLE super_admin SCHEMAFULL;
DEFINE FIELD username ON TABLE super_admin TYPE string;
DEFINE FIELD password_hash ON TABLE super_admin TYPE string;
DEFINE FIELD email ON TABLE super_admin TYPE option<string>;
DEFINE FIELD created_at ON TABLE super_admin TYPE int;
DEFINE FIELD created_by ON TABLE super_admin TYPE string;

-- =======================================================================
-- Wedding admins (record id = username)
-- =======================================================================
DEFINE TABLE wedding_admin SCHEMAFULL;
DEFINE FIELD username ON TABLE wedding_admin TYPE string;
DEFINE FIELD password_hash ON TABLE wedding_admin TYPE string;
DEFINE FIELD email ON TABLE wedding_admin TYPE option<string>;
DEFINE FIELD wedding_ids ON TABLE wedding_admin TYPE array<string> \
    DEFAULT [];
DEFINE FIELD user_type ON TABLE wedding_admin TYPE string \
    ASSERT $value IN ['client', 'staff'];
DEFINE FIELD must_change_password ON TABLE wedding_admin TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE wedding_admin TYPE int;
DEFINE FIELD created_by ON TABLE wedding_admin TYPE string;

-- =======================================================================
-- Legacy single-tenant admins (record id = username)
-- =======================================================================
DEFINE TABLE legacy_admin SCHEMAFULL;
DEFINE FIELD username ON TABLE legacy_admin TYPE string;
DEFINE FIELD password_hash ON TABLE legacy_admin TYPE string;
DEFINE FIELD must_change_password ON TABLE legacy_admin TYPE bool \
    DEFAULT false;
";

// -----------------------------------------------------------------------
// v2: weddings, slug index, admin links
// -----------------------------------------------------------------------

const SCHEMA_V2_WEDDINGS: &str = "\
-- =======================================================================
-- Weddings (record id = wedding UUID)
-- =======================================================================
DEFINE TABLE wedding SCHEMAFULL;
DEFINE FIELD slug ON TABLE wedding TYPE string;
DEFINE FIELD display_name ON TABLE wedding TYPE string;
DEFINE FIELD status ON TABLE wedding TYPE string \
    ASSERT $value IN ['draft', 'active', 'archived'];
DEFINE FIELD owner_id ON TABLE wedding TYPE string;
DEFINE FIELD co_owner_ids ON TABLE wedding TYPE array<string> DEFAULT [];
DEFINE FIELD created_at ON TABLE wedding TYPE int;
DEFINE FIELD created_by ON TABLE wedding TYPE string;
DEFINE FIELD archived_at ON TABLE wedding TYPE option<int>;
DEFINE INDEX idx_wedding_slug ON TABLE wedding COLUMNS slug UNIQUE;

-- =======================================================================
-- Slug index (record id = slug)
-- =======================================================================
DEFINE TABLE wedding_slug SCHEMAFULL;
DEFINE FIELD wedding_id ON TABLE wedding_slug TYPE string;

-- =======================================================================
-- Wedding admin links (record id = [wedding_id, username])
-- =======================================================================
DEFINE TABLE wedding_admin_link SCHEMAFULL;
DEFINE FIELD wedding_id ON TABLE wedding_admin_link TYPE string;
DEFINE FIELD username ON TABLE wedding_admin_link TYPE string;
DEFINE FIELD role ON TABLE wedding_admin_link TYPE string \
    ASSERT $value IN ['owner', 'staff'];
DEFINE FIELD added_at ON TABLE wedding_admin_link TYPE int;
DEFINE FIELD added_by ON TABLE wedding_admin_link TYPE string;
DEFINE INDEX idx_link_wedding ON TABLE wedding_admin_link \
    COLUMNS wedding_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

        info!(version = migration.version, "Migration applied successfully");
    }

    Ok(())
}

/// Number of migrations known to this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

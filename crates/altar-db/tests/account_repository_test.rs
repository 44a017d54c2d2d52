//! Integration tests for the account repositories using in-memory SurrealDB.

use altar_core::error::AltarError;
use altar_core::models::account::{
    CreateLegacyAdmin, CreateSuperAdmin, CreateWeddingAdmin, WeddingAdminType,
};
use altar_core::repository::{
    LegacyAdminRepository, SuperAdminRepository, WeddingAdminRepository,
};
use altar_db::repository::{
    SurrealLegacyAdminRepository, SurrealSuperAdminRepository, SurrealWeddingAdminRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    altar_db::run_migrations(&db).await.unwrap();
    db
}

fn wedding_admin(username: &str, user_type: WeddingAdminType) -> CreateWeddingAdmin {
    CreateWeddingAdmin {
        username: username.into(),
        password: "hunter2hunter2".into(),
        email: None,
        user_type,
        must_change_password: false,
        created_by: "master".into(),
    }
}

#[tokio::test]
async fn create_and_get_super_admin() {
    let repo = SurrealSuperAdminRepository::new(setup().await);

    let created = repo
        .create(CreateSuperAdmin {
            username: "  Olivia ".into(),
            password: "correct horse".into(),
            email: Some("olivia@example.com".into()),
            created_by: "master".into(),
        })
        .await
        .unwrap();

    assert_eq!(created.username, "olivia");
    assert!(created.password_hash.starts_with("$argon2id$"));
    assert_ne!(created.password_hash, "correct horse");

    let fetched = repo.get_by_username("olivia").await.unwrap();
    assert_eq!(fetched.username, "olivia");
    assert_eq!(fetched.email.as_deref(), Some("olivia@example.com"));
    assert_eq!(fetched.password_hash, created.password_hash);
    assert_eq!(
        fetched.created_at.timestamp_millis(),
        created.created_at.timestamp_millis()
    );
}

#[tokio::test]
async fn duplicate_super_admin_is_a_conflict() {
    let repo = SurrealSuperAdminRepository::new(setup().await);
    let input = CreateSuperAdmin {
        username: "olivia".into(),
        password: "one".into(),
        email: None,
        created_by: "master".into(),
    };

    repo.create(input.clone()).await.unwrap();
    let err = repo
        .create(CreateSuperAdmin {
            username: "OLIVIA".into(),
            ..input
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AltarError::AlreadyExists { .. }));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn list_and_delete_super_admins() {
    let repo = SurrealSuperAdminRepository::new(setup().await);
    for name in ["zoe", "adam"] {
        repo.create(CreateSuperAdmin {
            username: name.into(),
            password: "pw".into(),
            email: None,
            created_by: "master".into(),
        })
        .await
        .unwrap();
    }

    let names: Vec<String> = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.username)
        .collect();
    assert_eq!(names, vec!["adam", "zoe"]);

    repo.delete("adam").await.unwrap();
    assert!(repo.get_by_username("adam").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn missing_accounts_are_not_found() {
    let db = setup().await;

    let err = SurrealSuperAdminRepository::new(db.clone())
        .get_by_username("nobody")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let err = SurrealWeddingAdminRepository::new(db.clone())
        .get_by_username("nobody")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let err = SurrealLegacyAdminRepository::new(db)
        .get_by_username("nobody")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn wedding_admin_memberships_are_a_set() {
    let repo = SurrealWeddingAdminRepository::new(setup().await);
    let created = repo
        .create(wedding_admin("sam", WeddingAdminType::Staff))
        .await
        .unwrap();
    assert!(created.wedding_ids.is_empty());
    assert_eq!(created.user_type, WeddingAdminType::Staff);

    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    repo.add_wedding("sam", a).await.unwrap();
    repo.add_wedding("sam", a).await.unwrap();
    let admin = repo.add_wedding("sam", b).await.unwrap();
    assert_eq!(admin.wedding_ids.len(), 2);
    assert!(admin.wedding_ids.contains(&a));
    assert!(admin.wedding_ids.contains(&b));

    let admin = repo.remove_wedding("sam", a).await.unwrap();
    assert_eq!(admin.wedding_ids, vec![b]);

    // Removing an id that is not present changes nothing.
    let admin = repo.remove_wedding("sam", a).await.unwrap();
    assert_eq!(admin.wedding_ids, vec![b]);
}

#[tokio::test]
async fn membership_update_on_missing_admin_is_not_found() {
    let repo = SurrealWeddingAdminRepository::new(setup().await);

    let err = repo.add_wedding("ghost", Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_by_wedding_returns_members_only() {
    let repo = SurrealWeddingAdminRepository::new(setup().await);
    let wedding = Uuid::new_v4();

    for name in ["cleo", "bea", "dan"] {
        repo.create(wedding_admin(name, WeddingAdminType::Client))
            .await
            .unwrap();
    }
    repo.add_wedding("cleo", wedding).await.unwrap();
    repo.add_wedding("bea", wedding).await.unwrap();
    repo.add_wedding("dan", Uuid::new_v4()).await.unwrap();

    let members: Vec<String> = repo
        .list_by_wedding(wedding)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.username)
        .collect();
    assert_eq!(members, vec!["bea", "cleo"]);
}

#[tokio::test]
async fn set_password_rehashes_and_clears_flag() {
    let repo = SurrealWeddingAdminRepository::new(setup().await);
    let created = repo
        .create(CreateWeddingAdmin {
            must_change_password: true,
            ..wedding_admin("anna", WeddingAdminType::Client)
        })
        .await
        .unwrap();
    assert!(created.must_change_password);

    repo.set_password("anna", "a-new-password").await.unwrap();

    let fetched = repo.get_by_username("anna").await.unwrap();
    assert!(!fetched.must_change_password);
    assert_ne!(fetched.password_hash, created.password_hash);

    let err = repo.set_password("ghost", "whatever").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn legacy_admin_is_created_with_pepper() {
    let db = setup().await;
    let repo = SurrealLegacyAdminRepository::with_pepper(db, "pepper".into());

    let created = repo
        .create(CreateLegacyAdmin {
            username: "Legacy".into(),
            password: "old-password".into(),
            must_change_password: true,
        })
        .await
        .unwrap();
    assert_eq!(created.username, "legacy");

    let fetched = repo.get_by_username("legacy").await.unwrap();
    assert!(fetched.must_change_password);
    assert!(fetched.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn master_username_is_reserved_in_every_namespace() {
    let db = setup().await;

    let err = SurrealSuperAdminRepository::new(db.clone())
        .create(CreateSuperAdmin {
            username: "Master".into(),
            password: "super-pw".into(),
            email: None,
            created_by: "master".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let err = SurrealWeddingAdminRepository::new(db.clone())
        .create(wedding_admin(" MASTER", WeddingAdminType::Staff))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let legacy = SurrealLegacyAdminRepository::new(db);
    let err = legacy
        .create(CreateLegacyAdmin {
            username: "master".into(),
            password: "old-password".into(),
            must_change_password: false,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(legacy.get_by_username("master").await.unwrap_err().is_not_found());
}

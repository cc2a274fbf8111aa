//! Postgres repository tests. They need a scratch database:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use std::time::Duration;

use chrono::Utc;
use magic_villa::db;
use magic_villa::models::Villa;
use magic_villa::repository::{
    Filter, PgStore, Repository, RepositoryError, Store, VillaRepository,
};

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must name a test database");
    let pool = db::create_pool(&url, 5).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    PgStore::new(pool)
}

fn villa(name: String) -> Villa {
    Villa {
        id: 0,
        name,
        details: "Test".to_string(),
        rate: 120.0,
        sqft: 300,
        occupancy: 2,
        image_url: "https://img.example/test.jpg".to_string(),
        amenity: String::new(),
        created_date: Utc::now(),
        updated_date: None,
    }
}

fn fresh_name(prefix: &str) -> String {
    format!("{}{}", prefix, Utc::now().timestamp_micros())
}

async fn delete(store: &PgStore, id: i32) {
    let repo = store.villas();
    let row = repo.get(Some(Filter::eq(Villa::ID, id)), true).await.unwrap().unwrap();
    repo.remove(&row).await.unwrap();
    repo.save().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_visible_only_after_save() {
    let store = store().await;
    let name = fresh_name("Save");

    let repo = store.villas();
    let created = repo.create(villa(name.clone())).await.unwrap();
    assert!(created.id > 0);

    let by_name = || Some(Filter::eq_ignore_case(Villa::NAME, name.as_str()));
    assert!(store.villas().get(by_name(), false).await.unwrap().is_none());

    repo.save().await.unwrap();
    let stored = store.villas().get(by_name(), false).await.unwrap().unwrap();
    assert_eq!(stored.id, created.id);

    delete(&store, created.id).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_stamps_and_persists() {
    let store = store().await;
    let repo = store.villas();
    let created = repo.create(villa(fresh_name("Upd"))).await.unwrap();
    repo.save().await.unwrap();

    let repo = store.villas();
    let mut row = repo
        .get(Some(Filter::eq(Villa::ID, created.id)), true)
        .await
        .unwrap()
        .unwrap();
    row.rate = 999.0;
    repo.update(row).await.unwrap();
    repo.save().await.unwrap();

    let stored = store
        .villas()
        .get(Some(Filter::eq(Villa::ID, created.id)), false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.rate, 999.0);
    assert!(stored.updated_date.is_some());

    delete(&store, created.id).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_name_is_conflict() {
    let store = store().await;
    let repo = store.villas();

    let err = repo.create(villa("royal villa".to_string())).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { table: "villas" }));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_tracked_read_locks_row_until_save() {
    let store = store().await;
    let repo = store.villas();
    let created = repo.create(villa(fresh_name("Lock"))).await.unwrap();
    repo.save().await.unwrap();
    let by_id = || Some(Filter::eq(Villa::ID, created.id));

    let holder = store.villas();
    holder.get(by_id(), true).await.unwrap().unwrap();

    let waiter = store.villas();
    let blocked = tokio::time::timeout(Duration::from_millis(300), waiter.get(by_id(), true)).await;
    assert!(blocked.is_err(), "tracked read should wait for the row lock");
    drop(waiter);

    let untracked = store.villas().get(by_id(), false).await.unwrap();
    assert!(untracked.is_some());

    holder.save().await.unwrap();
    let next = store.villas();
    let acquired = tokio::time::timeout(Duration::from_secs(5), next.get(by_id(), true))
        .await
        .expect("lock released after save")
        .unwrap();
    assert!(acquired.is_some());
    next.save().await.unwrap();

    delete(&store, created.id).await;
}

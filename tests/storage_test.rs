//! Profile store against a real SQLite file.
//!
//! Run with: cargo test --test storage_test

use pretty_assertions::assert_eq;
use std::thread;
use tempfile::TempDir;

use sheetbot::core::error::AppError;
use sheetbot::core::types::{Plan, ProfileDefaults};
use sheetbot::storage::ProfileStore;

fn open(dir: &TempDir) -> ProfileStore {
    ProfileStore::open(dir.path().join("data").join("users.sqlite").to_str().unwrap()).unwrap()
}

#[test]
fn first_contact_gets_free_plan_one_credit_and_fallback_language() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);

    for id in [1_i64, 42, 1_000_000_007] {
        store.upsert(id, &ProfileDefaults::with_language("ru")).unwrap();
        let profile = store.get(id).unwrap();
        assert_eq!((profile.plan, profile.counter, profile.language.as_str()), (Plan::Free, 1, "ru"));
    }
}

#[test]
fn data_survives_reopening() {
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir);
        store.upsert(42, &ProfileDefaults::with_language("ru")).unwrap();
        store.set_language(42, "en").unwrap();
    }

    let store = open(&dir);
    assert_eq!(store.get(42).unwrap().language, "en");
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn concurrent_decrements_are_atomic() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.upsert(5, &ProfileDefaults::with_language("ru")).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    store.decrement_counter(5).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.get(5).unwrap().counter, 1 - 40);
}

#[test]
fn update_only_accepts_profile_columns() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.upsert(3, &ProfileDefaults::with_language("ru")).unwrap();

    for field in ["id", "users", "language; DROP TABLE users", ""] {
        assert!(
            matches!(store.update(3, field, "x"), Err(AppError::InvalidField(_))),
            "field {:?}",
            field
        );
    }
    assert_eq!(store.count().unwrap(), 1);
}

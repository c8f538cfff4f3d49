use std::future::Future;

use super::TestResult;
use crate::{KeyValueStorage, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "error",
            "versioned_create_on_existing_key",
            versioned_create_on_existing_key(factory).await,
        ),
        TestResult::from_result(
            "error",
            "versioned_update_on_missing_key",
            versioned_update_on_missing_key(factory).await,
        ),
        TestResult::from_result(
            "error",
            "rejected_create_does_not_overwrite",
            rejected_create_does_not_overwrite(factory).await,
        ),
        TestResult::from_result(
            "error",
            "rejected_update_does_not_create",
            rejected_update_does_not_create(factory).await,
        ),
    ]
}

// ── 1. Create-only write on an existing key returns AlreadyExists ────────────

async fn versioned_create_on_existing_key<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("profile-1", "{}".to_string())
        .await
        .map_err(|e| e.to_string())?;
    match s.put_versioned("profile-1", None, "{}".to_string()).await {
        Err(StorageError::AlreadyExists { key }) if key == "profile-1" => Ok(()),
        other => Err(format!(
            "expected AlreadyExists {{ key: profile-1 }}, got {:?}",
            other
        )),
    }
}

// ── 2. Update of a key never written returns NotFound ────────────────────────

async fn versioned_update_on_missing_key<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.put_versioned("ghost", Some(3), "{}".to_string()).await {
        Err(StorageError::NotFound { key }) if key == "ghost" => Ok(()),
        other => Err(format!("expected NotFound {{ key: ghost }}, got {:?}", other)),
    }
}

// ── 3. A rejected create leaves the existing payload in place ────────────────

async fn rejected_create_does_not_overwrite<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("k", "original".to_string())
        .await
        .map_err(|e| e.to_string())?;
    let _ = s.put_versioned("k", None, "intruder".to_string()).await;
    let rec = s
        .get("k")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("record vanished")?;
    if rec.payload != "original" {
        return Err(format!("payload overwritten: {:?}", rec.payload));
    }
    Ok(())
}

// ── 4. A rejected update does not materialize the key ────────────────────────

async fn rejected_update_does_not_create<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let _ = s.put_versioned("k", Some(0), "x".to_string()).await;
    match s.get("k").await {
        Ok(None) => Ok(()),
        other => Err(format!("expected no record, got {:?}", other)),
    }
}

use std::future::Future;

use super::{must_get, TestResult};
use crate::{KeyValueStorage, StorageError};

pub(super) async fn run_version_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "version",
            "versioned_create_when_absent",
            versioned_create_when_absent(factory).await,
        ),
        TestResult::from_result(
            "version",
            "versioned_write_with_current_version_succeeds",
            versioned_write_with_current_version_succeeds(factory).await,
        ),
        TestResult::from_result(
            "version",
            "stale_version_conflicts",
            stale_version_conflicts(factory).await,
        ),
        TestResult::from_result(
            "version",
            "conflict_leaves_record_unchanged",
            conflict_leaves_record_unchanged(factory).await,
        ),
        TestResult::from_result(
            "version",
            "read_modify_write_sequence",
            read_modify_write_sequence(factory).await,
        ),
        TestResult::from_result(
            "version",
            "blind_put_invalidates_stale_reader",
            blind_put_invalidates_stale_reader(factory).await,
        ),
    ]
}

// ── Versioned create ─────────────────────────────────────────────────────────

async fn versioned_create_when_absent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let v = s
        .put_versioned("k", None, "first".to_string())
        .await
        .map_err(|e| e.to_string())?;
    if v != 0 {
        return Err(format!("expected version 0, got {v}"));
    }
    let rec = must_get(&s, "k").await?;
    if rec.payload != "first" {
        return Err(format!("expected payload \"first\", got {:?}", rec.payload));
    }
    Ok(())
}

// ── Versioned update ─────────────────────────────────────────────────────────

async fn versioned_write_with_current_version_succeeds<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("k", "a".to_string()).await.map_err(|e| e.to_string())?;
    let v = s
        .put_versioned("k", Some(0), "b".to_string())
        .await
        .map_err(|e| e.to_string())?;
    if v != 1 {
        return Err(format!("expected version 1, got {v}"));
    }
    Ok(())
}

/// Two writers read version 0; the second to write must conflict.
async fn stale_version_conflicts<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("k", "a".to_string()).await.map_err(|e| e.to_string())?;
    s.put_versioned("k", Some(0), "writer-1".to_string())
        .await
        .map_err(|e| e.to_string())?;

    match s.put_versioned("k", Some(0), "writer-2".to_string()).await {
        Err(StorageError::ConcurrentConflict {
            key,
            expected_version,
            actual_version,
        }) => {
            if key != "k" || expected_version != 0 || actual_version != 1 {
                return Err(format!(
                    "conflict fields wrong: key={key} expected={expected_version} actual={actual_version}"
                ));
            }
            Ok(())
        }
        other => Err(format!("expected ConcurrentConflict, got {:?}", other)),
    }
}

async fn conflict_leaves_record_unchanged<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("k", "a".to_string()).await.map_err(|e| e.to_string())?;
    s.put("k", "b".to_string()).await.map_err(|e| e.to_string())?;
    let _ = s.put_versioned("k", Some(0), "stale".to_string()).await;

    let rec = must_get(&s, "k").await?;
    if rec.payload != "b" || rec.version != 1 {
        return Err(format!(
            "record changed by rejected write: ({}, {})",
            rec.payload, rec.version
        ));
    }
    Ok(())
}

/// get -> put_versioned(version) repeated keeps advancing by one.
async fn read_modify_write_sequence<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put_versioned("counter", None, "0".to_string())
        .await
        .map_err(|e| e.to_string())?;
    for _ in 0..5 {
        let rec = must_get(&s, "counter").await?;
        let n: u32 = rec
            .payload
            .parse()
            .map_err(|e| format!("bad payload {:?}: {e}", rec.payload))?;
        s.put_versioned("counter", Some(rec.version), (n + 1).to_string())
            .await
            .map_err(|e| e.to_string())?;
    }
    let rec = must_get(&s, "counter").await?;
    if rec.payload != "5" || rec.version != 5 {
        return Err(format!(
            "expected (5, 5), got ({}, {})",
            rec.payload, rec.version
        ));
    }
    Ok(())
}

async fn blind_put_invalidates_stale_reader<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("k", "a".to_string()).await.map_err(|e| e.to_string())?;
    let read = must_get(&s, "k").await?;
    s.put("k", "overwrite".to_string())
        .await
        .map_err(|e| e.to_string())?;
    match s
        .put_versioned("k", Some(read.version), "late".to_string())
        .await
    {
        Err(StorageError::ConcurrentConflict { .. }) => Ok(()),
        other => Err(format!("expected ConcurrentConflict, got {:?}", other)),
    }
}

use std::future::Future;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::{must_get, TestResult};
use crate::KeyValueStorage;

pub(super) async fn run_basic_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "basic",
            "get_missing_returns_none",
            get_missing_returns_none(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "put_then_get_returns_payload",
            put_then_get_returns_payload(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "first_put_is_version_0",
            first_put_is_version_0(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "put_overwrites_and_bumps_version",
            put_overwrites_and_bumps_version(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "updated_at_is_rfc3339",
            updated_at_is_rfc3339(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "keys_are_independent",
            keys_are_independent(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "remove_existing_returns_true",
            remove_existing_returns_true(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "remove_missing_returns_false",
            remove_missing_returns_false(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "put_after_remove_restarts_at_version_0",
            put_after_remove_restarts_at_version_0(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "list_keys_filters_by_prefix_sorted",
            list_keys_filters_by_prefix_sorted(factory).await,
        ),
        TestResult::from_result(
            "basic",
            "list_keys_empty_store",
            list_keys_empty_store(factory).await,
        ),
    ]
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn get_missing_returns_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get("challenge-nope-progress").await {
        Ok(None) => Ok(()),
        other => Err(format!("expected Ok(None), got {:?}", other)),
    }
}

async fn put_then_get_returns_payload<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let payload = r#"{"currentDay":2,"tasks":[]}"#.to_string();
    s.put("challenge-a-progress", payload.clone())
        .await
        .map_err(|e| e.to_string())?;

    let rec = must_get(&s, "challenge-a-progress").await?;
    if rec.payload != payload {
        return Err(format!("payload mismatch: got {:?}", rec.payload));
    }
    if rec.key != "challenge-a-progress" {
        return Err(format!("key mismatch: got {:?}", rec.key));
    }
    Ok(())
}

async fn first_put_is_version_0<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let v = s
        .put("k", "v".to_string())
        .await
        .map_err(|e| e.to_string())?;
    if v != 0 {
        return Err(format!("expected returned version 0, got {v}"));
    }
    let rec = must_get(&s, "k").await?;
    if rec.version != 0 {
        return Err(format!("expected stored version 0, got {}", rec.version));
    }
    Ok(())
}

async fn put_overwrites_and_bumps_version<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for (i, payload) in ["one", "two", "three"].iter().enumerate() {
        let v = s
            .put("k", payload.to_string())
            .await
            .map_err(|e| e.to_string())?;
        if v != i as i64 {
            return Err(format!("write {i}: expected version {i}, got {v}"));
        }
    }
    let rec = must_get(&s, "k").await?;
    if rec.payload != "three" || rec.version != 2 {
        return Err(format!(
            "expected (three, 2), got ({}, {})",
            rec.payload, rec.version
        ));
    }
    Ok(())
}

async fn updated_at_is_rfc3339<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("k", "v".to_string())
        .await
        .map_err(|e| e.to_string())?;
    let rec = must_get(&s, "k").await?;
    OffsetDateTime::parse(&rec.updated_at, &Rfc3339)
        .map(|_| ())
        .map_err(|e| format!("updated_at {:?} is not RFC 3339: {e}", rec.updated_at))
}

async fn keys_are_independent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("a", "1".to_string()).await.map_err(|e| e.to_string())?;
    s.put("a", "2".to_string()).await.map_err(|e| e.to_string())?;
    s.put("b", "x".to_string()).await.map_err(|e| e.to_string())?;

    let a = must_get(&s, "a").await?;
    let b = must_get(&s, "b").await?;
    if a.version != 1 || b.version != 0 {
        return Err(format!(
            "expected versions (1, 0), got ({}, {})",
            a.version, b.version
        ));
    }
    if b.payload != "x" {
        return Err(format!("b payload clobbered: {:?}", b.payload));
    }
    Ok(())
}

async fn remove_existing_returns_true<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("k", "v".to_string()).await.map_err(|e| e.to_string())?;
    let removed = s.remove("k").await.map_err(|e| e.to_string())?;
    if !removed {
        return Err("remove of existing key returned false".to_string());
    }
    match s.get("k").await {
        Ok(None) => Ok(()),
        other => Err(format!("expected key gone after remove, got {:?}", other)),
    }
}

async fn remove_missing_returns_false<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.remove("never-written").await {
        Ok(false) => Ok(()),
        other => Err(format!("expected Ok(false), got {:?}", other)),
    }
}

async fn put_after_remove_restarts_at_version_0<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("k", "1".to_string()).await.map_err(|e| e.to_string())?;
    s.put("k", "2".to_string()).await.map_err(|e| e.to_string())?;
    s.remove("k").await.map_err(|e| e.to_string())?;
    let v = s
        .put("k", "3".to_string())
        .await
        .map_err(|e| e.to_string())?;
    if v != 0 {
        return Err(format!("expected version 0 after remove, got {v}"));
    }
    Ok(())
}

async fn list_keys_filters_by_prefix_sorted<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for key in [
        "challenge-zero-waste-progress",
        "ecoquest-user-data",
        "challenge-water-conservation-progress",
    ] {
        s.put(key, "{}".to_string())
            .await
            .map_err(|e| e.to_string())?;
    }
    let keys = s.list_keys("challenge-").await.map_err(|e| e.to_string())?;
    let expected = vec![
        "challenge-water-conservation-progress".to_string(),
        "challenge-zero-waste-progress".to_string(),
    ];
    if keys != expected {
        return Err(format!("expected {:?}, got {:?}", expected, keys));
    }
    let all = s.list_keys("").await.map_err(|e| e.to_string())?;
    if all.len() != 3 {
        return Err(format!("expected 3 keys with empty prefix, got {:?}", all));
    }
    Ok(())
}

async fn list_keys_empty_store<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let keys = s.list_keys("").await.map_err(|e| e.to_string())?;
    if !keys.is_empty() {
        return Err(format!("expected no keys, got {:?}", keys));
    }
    Ok(())
}

use std::future::Future;
use std::sync::Arc;

use super::{must_get, TestResult};
use crate::{KeyValueStorage, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "concurrent",
            "concurrent_versioned_writes_exactly_one_wins",
            concurrent_versioned_writes_exactly_one_wins(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_creates_exactly_one_wins",
            concurrent_creates_exactly_one_wins(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_puts_distinct_keys_all_succeed",
            concurrent_puts_distinct_keys_all_succeed(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_blind_puts_count_every_write",
            concurrent_blind_puts_count_every_write(factory).await,
        ),
    ]
}

// ── Versioned write race: exactly one wins ───────────────────────────────────

/// N tasks each try to write the same key from version 0. Exactly one
/// succeeds; the rest must get ConcurrentConflict.
async fn concurrent_versioned_writes_exactly_one_wins<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    storage
        .put("progress", "initial".to_string())
        .await
        .map_err(|e| format!("seed: {e}"))?;

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            match s.put_versioned("progress", Some(0), format!("writer-{i}")).await {
                Ok(_) => Ok(true),
                Err(StorageError::ConcurrentConflict { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        }));
    }

    let winners = count_winners(handles).await?;
    if winners != 1 {
        return Err(format!("expected exactly 1 winner, got {winners}"));
    }
    let rec = must_get(storage.as_ref(), "progress").await?;
    if rec.version != 1 {
        return Err(format!("expected final version 1, got {}", rec.version));
    }
    Ok(())
}

// ── Create race: exactly one wins ────────────────────────────────────────────

async fn concurrent_creates_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            match s.put_versioned("profile", None, format!("creator-{i}")).await {
                Ok(_) => Ok(true),
                Err(StorageError::AlreadyExists { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        }));
    }

    let winners = count_winners(handles).await?;
    if winners != 1 {
        return Err(format!("expected exactly 1 creator, got {winners}"));
    }
    Ok(())
}

// ── Independent keys do not interfere ────────────────────────────────────────

async fn concurrent_puts_distinct_keys_all_succeed<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            s.put(&format!("challenge-{i}-progress"), i.to_string())
                .await
                .map(|_| true)
        }));
    }

    let winners = count_winners(handles).await?;
    if winners != N {
        return Err(format!("expected {N} successful writes, got {winners}"));
    }
    let keys = storage
        .list_keys("challenge-")
        .await
        .map_err(|e| e.to_string())?;
    if keys.len() != N {
        return Err(format!("expected {N} keys, got {}", keys.len()));
    }
    Ok(())
}

// ── Blind overwrites: last write wins, but every write bumps the version ─────

async fn concurrent_blind_puts_count_every_write<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            s.put("shared", format!("w{i}")).await.map(|_| true)
        }));
    }
    count_winners(handles).await?;

    let rec = must_get(storage.as_ref(), "shared").await?;
    if rec.version != (N as i64) - 1 {
        return Err(format!(
            "expected version {} after {N} writes, got {}",
            N - 1,
            rec.version
        ));
    }
    Ok(())
}

async fn count_winners(
    handles: Vec<tokio::task::JoinHandle<Result<bool, StorageError>>>,
) -> Result<usize, String> {
    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("storage error: {e}"))?;
        if won {
            winners += 1;
        }
    }
    Ok(winners)
}

//! Conformance test suite for `KeyValueStorage` implementations.
//!
//! A backend-agnostic suite that any `KeyValueStorage` implementation can run
//! to verify correctness. The suite covers:
//!
//! - **Basic writes**: put/get round trip, version stamps, overwrite, removal
//! - **Listing**: prefix filtering and ordering of `list_keys`
//! - **Versioned writes**: compare-and-swap semantics of `put_versioned`
//! - **Errors**: correct error variants and fields for rejected writes
//! - **Concurrency**: racing versioned writes produce exactly one winner
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that creates a
//! fresh, empty storage instance for each test:
//!
//! ```ignore
//! use ecoquest_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn my_backend_conformance() {
//!     let report = run_conformance_suite(|| async { MyBackend::new() }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod basic;
mod concurrent;
mod error;
mod version;

use std::fmt;
use std::future::Future;

use crate::KeyValueStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "basic", "version").
    pub category: String,
    /// Test name (e.g. "first_put_is_version_0").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in self.results.iter().filter(|r| !r.passed) {
            writeln!(
                f,
                "  FAIL [{}/{}]: {}",
                r.category,
                r.name,
                r.message.as_deref().unwrap_or("(no message)")
            )?;
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// storage instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: KeyValueStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(basic::run_basic_tests(&factory).await);
    results.extend(version::run_version_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

/// Fetch a record that the test expects to exist.
async fn must_get<S: KeyValueStorage>(
    s: &S,
    key: &str,
) -> Result<crate::StoredRecord, String> {
    s.get(key)
        .await
        .map_err(|e| format!("get {key}: {e}"))?
        .ok_or_else(|| format!("expected record under {key}, found none"))
}

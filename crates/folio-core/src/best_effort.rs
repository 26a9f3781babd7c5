//! Wrapper for pipeline steps whose failure must not fail the pipeline.

use std::fmt::Display;
use std::future::Future;

/// Runs `step`, logging and discarding any error.
///
/// Used for housekeeping (archiving the previous version, pruning history)
/// where "the write succeeded" outranks "the housekeeping succeeded".
/// Returns `None` when the step failed.
pub async fn best_effort<T, E, F>(step: &'static str, subject: &str, fut: F) -> Option<T>
where
    E: Display,
    F: Future<Output = std::result::Result<T, E>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(step, subject, error = %e, "Best-effort step failed; continuing");
            None
        }
    }
}

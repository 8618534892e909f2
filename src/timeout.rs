//! First-settled-wins timeout combinator.
//!
//! DESIGN
//! ======
//! The guarded operation runs as its own task. If the bound elapses first the
//! `JoinHandle` is dropped, which detaches the task: the underlying work may
//! still finish, but its output goes nowhere.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinError;

/// Race `op` against `bound`.
///
/// Resolves with the operation's own result if it settles first, otherwise
/// with `on_timeout`. A panicking operation surfaces through `E: From<JoinError>`.
///
/// # Errors
///
/// Returns `on_timeout` when the bound elapses, or the operation's error.
pub async fn race<F, T, E>(op: F, bound: Duration, on_timeout: E) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    let handle = tokio::spawn(op);
    tokio::select! {
        joined = handle => joined?,
        () = tokio::time::sleep(bound) => Err(on_timeout),
    }
}

#[cfg(test)]
#[path = "timeout_test.rs"]
mod tests;

//! Timeout helpers for waiting on sessions and collaborators

use std::future::Future;
use std::time::Duration;

use crate::types::{Result, WeaveError};

/// Execute an async operation with a timeout
///
/// Returns `WeaveError::Timeout` if the operation doesn't complete in time.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(WeaveError::timeout(operation_name, timeout)),
    }
}

/// Like [`with_timeout`], but `None` waits indefinitely
pub async fn with_optional_timeout<T, F>(
    timeout: Option<Duration>,
    future: F,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(timeout) => with_timeout(timeout, future, operation_name).await,
        None => future.await,
    }
}

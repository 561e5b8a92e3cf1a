//! Hard timeout around transport operations
//!
//! Every fetch runs under `tokio::time::timeout`; an expired timer becomes a
//! `FetchError::Timeout`, which the session counts as a route failure.

use std::future::Future;
use std::time::Duration;

use crate::fetch::FetchError;

/// Run `operation`, failing with `FetchError::Timeout` after `timeout_secs`
///
/// # Arguments
/// * `operation` - The transport future to bound
/// * `timeout_secs` - Timeout in seconds
/// * `operation_name` - Human-readable name for the error message
pub async fn with_fetch_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            operation: operation_name.to_string(),
            secs: timeout_secs,
        }),
    }
}

use crate::{
    config::database::operation_timeout,
    error::{AppError, AppResult},
};
use std::future::Future;

/// Runs a store operation under the configured time bound. Exceeding it is
/// reported as [`AppError::Timeout`].
pub async fn bounded<T, F>(operation: &'static str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    let limit = operation_timeout();
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(operation, ?limit, "store operation timed out");
            Err(AppError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_result() {
        let value = bounded("noop", async { Ok::<_, AppError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out() {
        let result = bounded("sleep", async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok::<_, AppError>(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Timeout)));
    }
}

use std::future::Future;
use std::time::Duration;

use crate::types::{MatchError, Service};

/// Await a collaborator call under `limit`, lifting its error into
/// [`MatchError`]. Elapsed timeouts become `TransientServiceFailure`.
pub(crate) async fn bounded<T, E, F>(service: Service, limit: Duration, call: F) -> Result<T, MatchError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<MatchError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(service = %service, limit_ms = limit.as_millis() as u64, "collaborator call timed out");
            Err(MatchError::timed_out(service, limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::IndexError;

    #[tokio::test]
    async fn passes_through_results() {
        let ok = bounded(Service::Index, Duration::from_secs(1), async {
            Ok::<_, IndexError>(7)
        })
        .await;
        assert_eq!(ok, Ok(7));

        let err = bounded(Service::Index, Duration::from_secs(1), async {
            Err::<(), _>(IndexError::Closed)
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), "TRANSIENT_SERVICE_FAILURE");
    }

    #[tokio::test]
    async fn elapsed_timeout_is_transient() {
        let err = bounded(Service::Embedding, Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, IndexError>(())
        })
        .await
        .unwrap_err();
        match err {
            MatchError::TransientServiceFailure { service, message } => {
                assert_eq!(service, Service::Embedding);
                assert!(message.contains("timed out"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

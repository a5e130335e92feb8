//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap filesystem calls with a deadline
//! - Report expiry as an ordinary I/O failure
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Expiry maps to `io::ErrorKind::TimedOut` so callers keep a single error path

use std::future::Future;
use std::io;
use std::time::Duration;

/// Run `fut`, failing with `TimedOut` if it does not finish within `deadline`.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("timed out after {} ms", deadline.as_millis()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_result() {
        let value = with_deadline(Duration::from_secs(1), async { Ok::<_, io::Error>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_expiry_is_timed_out() {
        let err = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, io::Error>(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_eq!(err.to_string(), "timed out after 10 ms");
    }
}

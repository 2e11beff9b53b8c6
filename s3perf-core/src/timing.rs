//! Wall-clock measurement of storage operations.

use std::future::Future;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Runs `operation` to completion and returns its output along with the elapsed time in
/// milliseconds.
///
/// The operation is passed un-awaited, so nothing happens before the clock starts. The clock stops
/// as soon as the future resolves, regardless of whether it resolved to an error.
pub async fn time_operation<F>(operation: F) -> (F::Output, f64)
where
    F: Future,
{
    let start = Instant::now();
    let output = operation.await;
    let latency = start.elapsed().as_secs_f64() * 1000.0;

    (output, latency)
}

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
pub fn now_epoch_millis() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        // clock set before 1970
        Err(err) => -(err.duration().as_millis() as i64),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn measures_sleep() {
        let (output, latency) = time_operation(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            42
        })
        .await;

        assert_eq!(output, 42);
        assert!((45.0..=300.0).contains(&latency), "measured {latency}ms");
    }

    #[tokio::test]
    async fn measures_deferred_operation() {
        let operation = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
        };
        // Nothing runs while the future sits idle.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let ((), latency) = time_operation(operation).await;
        assert!((45.0..=300.0).contains(&latency), "measured {latency}ms");
    }

    #[tokio::test]
    async fn measures_failures() {
        let (output, latency) = time_operation(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err::<(), _>("boom")
        })
        .await;

        assert!(output.is_err());
        assert!(latency >= 45.0, "measured {latency}ms");
    }

    #[test]
    fn epoch_millis_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_epoch_millis() > 1_577_836_800_000);
    }
}

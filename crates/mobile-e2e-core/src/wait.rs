//! Bounded polling

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    timeout: Duration,
    poll_interval: Duration,
}

impl Wait {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Poll `probe` until it yields a value or the timeout expires
    ///
    /// Probe errors count as "not yet"; the last one is kept for the timeout
    /// message. The probe always runs at least once.
    pub async fn until<T, E, F, Fut>(&self, what: &str, mut probe: F) -> Result<T>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, E>>,
    {
        let start = Instant::now();
        let mut last_error: Option<String> = None;

        loop {
            match probe().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) => last_error = Some(e.to_string()),
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                let what = match last_error {
                    Some(err) => format!("{what} (last error: {err})"),
                    None => what.to_string(),
                };
                debug!("Wait expired after {:?}: {}", elapsed, what);
                return Err(E2eError::Timeout {
                    what,
                    waited: self.timeout,
                });
            }
            sleep(self.poll_interval.min(self.timeout - elapsed)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_until_returns_first_value() {
        let calls = AtomicU32::new(0);
        let wait = Wait::new(Duration::from_secs(5), Duration::from_millis(250));

        let value = wait
            .until("counter", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, String>((n >= 3).then_some(n)) }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_times_out_with_last_error() {
        let wait = Wait::new(Duration::from_secs(2), Duration::from_millis(500));
        let started = Instant::now();

        let err = wait
            .until("login button", || async { Err::<Option<()>, _>("no such element") })
            .await
            .unwrap_err();

        assert!(started.elapsed() >= Duration::from_secs(2));
        match err {
            E2eError::Timeout { what, waited } => {
                assert!(what.contains("login button"));
                assert!(what.contains("no such element"));
                assert_eq!(waited, Duration::from_secs(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_probes_once() {
        let calls = AtomicU32::new(0);
        let wait = Wait::new(Duration::ZERO, Duration::from_millis(100));
        let result = wait
            .until("anything", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<Option<()>, String>(None) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

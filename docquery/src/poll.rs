//! Poll loops for asynchronous remote jobs.
//!
//! File batch ingestion and assistant runs both finish asynchronously on the
//! service side. [`Poller`] fetches the job state until a terminal predicate
//! holds, backing off between attempts, and gives up on timeout or when its
//! [`CancellationToken`] fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};

/// Interval, backoff and timeout of a poll loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second fetch.
    pub interval: Duration,
    /// Upper bound for the delay between fetches.
    pub max_interval: Duration,
    /// Factor applied to the delay after every fetch.
    pub multiplier: f64,
    /// Give up after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            multiplier: 1.5,
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl PollPolicy {
    /// Poll at a fixed interval with no timeout.
    #[must_use]
    pub const fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            multiplier: 1.0,
            timeout: None,
        }
    }

    /// Set the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Delay that follows `current`, never above `max_interval`.
    ///
    /// A non-finite or overflowing product yields `max_interval`.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration {
        let scaled = current.as_secs_f64() * self.multiplier.max(1.0);
        Duration::try_from_secs_f64(scaled)
            .map_or(self.max_interval, |d| d.min(self.max_interval))
    }
}

/// Runs poll loops under a shared policy and cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl Poller {
    /// Create a poller with a fresh cancellation token.
    #[must_use]
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` as the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The active policy.
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// A handle that cancels every poll run by this poller.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fetch with `fetch` until `is_terminal` holds, then return the last
    /// state.
    ///
    /// Fetch errors end the loop immediately. `operation` names the job in
    /// logs and timeout errors.
    pub async fn until<T, F, Fut>(
        &self,
        operation: &str,
        mut fetch: F,
        is_terminal: impl Fn(&T) -> bool,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut delay = self.policy.interval;
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            attempt += 1;
            let state = fetch().await?;
            if is_terminal(&state) {
                debug!(operation, attempt, "poll finished");
                return Ok(state);
            }

            let mut sleep_for = delay;
            if let Some(timeout) = self.policy.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    return Err(Error::poll_timeout(operation, elapsed));
                }
                sleep_for = sleep_for.min(timeout - elapsed);
            }

            debug!(operation, attempt, delay = ?sleep_for, "still pending");
            tokio::select! {
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(sleep_for) => {}
            }
            delay = self.policy.next_delay(delay);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_fetch(
        done_after: u32,
    ) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<u32>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let fetch = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Ok(n.min(done_after)))
        };
        (calls, fetch)
    }

    mod policy {
        use super::*;

        #[test]
        fn backoff_is_capped() {
            let policy = PollPolicy {
                interval: Duration::from_secs(1),
                max_interval: Duration::from_secs(3),
                multiplier: 2.0,
                timeout: None,
            };
            let d1 = policy.next_delay(policy.interval);
            let d2 = policy.next_delay(d1);
            let d3 = policy.next_delay(d2);
            assert_eq!(d1, Duration::from_secs(2));
            assert_eq!(d2, Duration::from_secs(3));
            assert_eq!(d3, Duration::from_secs(3));
        }

        #[test]
        fn multiplier_below_one_never_shrinks() {
            let policy = PollPolicy {
                multiplier: 0.5,
                ..PollPolicy::fixed(Duration::from_secs(2))
            };
            assert_eq!(policy.next_delay(Duration::from_secs(2)), Duration::from_secs(2));
        }

        #[test]
        fn huge_or_infinite_multiplier_saturates_at_cap() {
            for multiplier in [f64::INFINITY, 1e300, f64::NAN] {
                let policy = PollPolicy {
                    interval: Duration::from_secs(1),
                    max_interval: Duration::from_secs(10),
                    multiplier,
                    timeout: None,
                };
                let delay = policy.next_delay(policy.interval);
                assert!(delay <= Duration::from_secs(10), "{multiplier}: {delay:?}");
            }
        }
    }

    mod until {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn returns_first_terminal_state() {
            let poller = Poller::new(PollPolicy::fixed(Duration::from_secs(1)));
            let (calls, fetch) = counting_fetch(3);

            let state = poller.until("batch", fetch, |n| *n == 3).await.unwrap();
            assert_eq!(state, 3);
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn terminal_on_first_fetch_does_not_sleep() {
            let poller = Poller::new(PollPolicy::fixed(Duration::from_secs(60)));
            let started = Instant::now();
            let (_, fetch) = counting_fetch(1);

            poller.until("run", fetch, |_| true).await.unwrap();
            assert!(started.elapsed() < Duration::from_secs(1));
        }

        #[tokio::test(start_paused = true)]
        async fn times_out() {
            let poller =
                Poller::new(PollPolicy::fixed(Duration::from_secs(1)).with_timeout(Duration::from_secs(5)));
            let (_, fetch) = counting_fetch(u32::MAX);

            let err = poller.until("run run_1", fetch, |_| false).await.unwrap_err();
            match err {
                Error::PollTimeout { operation, waited } => {
                    assert_eq!(operation, "run run_1");
                    assert!(waited >= Duration::from_secs(5));
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn cancellation_interrupts_sleep() {
            let poller = Poller::new(PollPolicy::fixed(Duration::from_secs(3600)));
            let token = poller.cancellation_token();
            let (calls, fetch) = counting_fetch(u32::MAX);

            let handle = tokio::spawn(async move { poller.until("batch", fetch, |_| false).await });
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();

            let err = handle.await.unwrap().unwrap_err();
            assert!(err.is_cancelled());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn cancelled_before_start_never_fetches() {
            let token = CancellationToken::new();
            token.cancel();
            let poller = Poller::default().with_cancellation(token);
            let (calls, fetch) = counting_fetch(1);

            assert!(poller.until("batch", fetch, |_| true).await.unwrap_err().is_cancelled());
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn fetch_error_stops_loop() {
            let poller = Poller::new(PollPolicy::fixed(Duration::from_millis(10)));
            let err = poller
                .until(
                    "run",
                    || std::future::ready(Err::<u32, _>(crate::ApiError::network("reset").into())),
                    |_| true,
                )
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Api(_)));
        }
    }
}

//! Retry supervision for whole-product crawl attempts.
//!
//! The unit of retry is the entire product pipeline, never a single field or
//! page: partial results from a failed attempt are discarded and the next
//! attempt starts from a fresh session. A product that exhausts its attempts
//! is abandoned without poisoning the rest of the run.

use async_trait::async_trait;
use tracing::{error, warn};

use super::error::CrawlError;
use super::session::Session;

/// One retryable unit of work executed against a session.
#[async_trait]
pub trait CrawlAttempt: Sync {
    type Output: Send;

    async fn attempt(
        &self,
        session: &mut dyn Session,
        attempt: u32,
    ) -> Result<Self::Output, CrawlError>;
}

/// Runs a [`CrawlAttempt`] up to `max_attempts` times, resetting the session
/// between attempts.
pub struct RetrySupervisor {
    max_attempts: u32,
    retry_delay: std::time::Duration,
}

impl RetrySupervisor {
    pub fn new(max_attempts: u32, retry_delay: std::time::Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Supervise one unit of work. `Ok(None)` means every attempt failed and
    /// the unit is abandoned; `Err` is reserved for failures that must abort
    /// the enclosing run, like a session that cannot be re-established.
    pub async fn run<A: CrawlAttempt>(
        &self,
        session: &mut dyn Session,
        work: &A,
    ) -> Result<Option<A::Output>, CrawlError> {
        for attempt in 1..=self.max_attempts {
            match work.attempt(session, attempt).await {
                Ok(output) => return Ok(Some(output)),
                Err(e) if e.is_critical() => return Err(e),
                Err(e) => {
                    warn!(attempt, max = self.max_attempts, error = %e, "crawl attempt failed");
                    if attempt == self.max_attempts {
                        break;
                    }
                    tokio::time::sleep(self.retry_delay).await;
                    if let Err(reset) = session.reset().await {
                        error!(attempt, error = %reset, "session reset failed, aborting run");
                        return Err(CrawlError::SessionResetFailed {
                            attempt,
                            source: reset,
                        });
                    }
                }
            }
        }
        warn!(attempts = self.max_attempts, "unit abandoned after exhausting attempts");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use crate::infrastructure::session::{SessionError, SessionResult};

    struct CountingSession {
        resets: u32,
        fail_reset: bool,
    }

    #[async_trait]
    impl Session for CountingSession {
        async fn load(&mut self, _url: &str) -> SessionResult<()> {
            Ok(())
        }
        async fn content(&mut self) -> SessionResult<String> {
            Ok(String::new())
        }
        async fn element_texts(&mut self, _selector: &str) -> SessionResult<Vec<String>> {
            Ok(Vec::new())
        }
        async fn click_nth(&mut self, _selector: &str, _index: usize) -> SessionResult<bool> {
            Ok(false)
        }
        async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> SessionResult<bool> {
            Ok(true)
        }
        async fn reset(&mut self) -> SessionResult<()> {
            if self.fail_reset {
                return Err(SessionError::Unavailable("driver gone".to_string()));
            }
            self.resets += 1;
            Ok(())
        }
    }

    /// Fails the first `failures` attempts, then succeeds with the attempt
    /// number it ran on.
    struct FlakyWork {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CrawlAttempt for FlakyWork {
        type Output = u32;

        async fn attempt(
            &self,
            _session: &mut dyn Session,
            attempt: u32,
        ) -> Result<u32, CrawlError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if attempt <= self.failures {
                Err(CrawlError::Session(SessionError::Lost(
                    "render stalled".to_string(),
                )))
            } else {
                Ok(attempt)
            }
        }
    }

    fn supervisor() -> RetrySupervisor {
        RetrySupervisor::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_on_a_later_attempt_after_resets() {
        let mut session = CountingSession {
            resets: 0,
            fail_reset: false,
        };
        let work = FlakyWork {
            failures: 2,
            calls: AtomicU32::new(0),
        };
        let out = supervisor().run(&mut session, &work).await.unwrap();
        assert_eq!(out, Some(3));
        assert_eq!(work.calls.load(Ordering::SeqCst), 3);
        assert_eq!(session.resets, 2);
    }

    #[tokio::test]
    async fn exhausted_attempts_abandon_without_error() {
        let mut session = CountingSession {
            resets: 0,
            fail_reset: false,
        };
        let work = FlakyWork {
            failures: 10,
            calls: AtomicU32::new(0),
        };
        let out = supervisor().run(&mut session, &work).await.unwrap();
        assert!(out.is_none());
        assert_eq!(work.calls.load(Ordering::SeqCst), 3);
        // No reset after the final failed attempt.
        assert_eq!(session.resets, 2);
    }

    #[tokio::test]
    async fn failed_reset_aborts_instead_of_retrying() {
        let mut session = CountingSession {
            resets: 0,
            fail_reset: true,
        };
        let work = FlakyWork {
            failures: 10,
            calls: AtomicU32::new(0),
        };
        let err = supervisor().run(&mut session, &work).await.unwrap_err();
        assert!(matches!(err, CrawlError::SessionResetFailed { attempt: 1, .. }));
        assert!(err.is_critical());
        assert_eq!(work.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn critical_attempt_errors_skip_the_retry_loop() {
        let mut session = CountingSession {
            resets: 0,
            fail_reset: false,
        };
        struct FatalWork;

        #[async_trait]
        impl CrawlAttempt for FatalWork {
            type Output = ();

            async fn attempt(
                &self,
                _session: &mut dyn Session,
                _attempt: u32,
            ) -> Result<(), CrawlError> {
                Err(CrawlError::invalid_target("nonsense", "no scheme"))
            }
        }

        let err = supervisor().run(&mut session, &FatalWork).await.unwrap_err();
        assert!(matches!(err, CrawlError::InvalidTarget { .. }));
        assert_eq!(session.resets, 0);
    }
}

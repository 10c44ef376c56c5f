//! Fallback manager
//!
//! Two guarantees for unreliable work:
//! - [`FallbackManager::execute_with_fallback`] never propagates: an error or
//!   a panic yields the caller's fallback value verbatim
//! - [`FallbackManager::execute_with_retry`] retries transient inference
//!   errors with bounded exponential backoff and jitter

use crate::config::RetryPolicy;
use crate::ports::inference_gateway::InferenceError;
use futures::FutureExt;
use rand_core::{OsRng, RngCore};
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

/// Stateless wrapper around fallible async units.
///
/// Holds only its retry policy: identical calls give identical results.
#[derive(Debug, Clone, Default)]
pub struct FallbackManager {
    retry: RetryPolicy,
}

impl FallbackManager {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run `unit`; on `Err` or panic, log with `context_label` and return
    /// `fallback_value`.
    pub async fn execute_with_fallback<T, E, F>(&self, unit: F, fallback_value: T, context_label: &str) -> T
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        match AssertUnwindSafe(unit).catch_unwind().await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!("{} failed, using fallback: {}", context_label, e);
                fallback_value
            }
            Err(payload) => {
                warn!(
                    "{} panicked, using fallback: {}",
                    context_label,
                    panic_message(payload.as_ref())
                );
                fallback_value
            }
        }
    }

    /// Run the unit built by `make_unit`, retrying transient errors.
    ///
    /// `make_unit` receives the 1-based attempt number. Permanent errors and
    /// the last transient error are returned as-is.
    pub async fn execute_with_retry<T, F, Fut>(&self, label: &str, mut make_unit: F) -> Result<T, InferenceError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, InferenceError>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match make_unit(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let mut delay = self.retry.delay_for(attempt, OsRng.next_u64());
                    if let InferenceError::RateLimited {
                        retry_after: Some(after),
                    } = &e
                    {
                        delay = delay.max(*after).min(self.retry.max_delay);
                    }
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {}ms",
                        label,
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn manager(max_attempts: u32) -> FallbackManager {
        FallbackManager::new(RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
            jitter: 0.5,
        })
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let value = manager(1)
            .execute_with_fallback(async { Ok::<_, String>(7) }, 0, "unit")
            .await;
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_error_returns_fallback_verbatim() {
        let value = manager(1)
            .execute_with_fallback(async { Err::<String, _>("boom") }, "fallback".to_string(), "unit")
            .await;
        assert_eq!(value, "fallback");
    }

    #[tokio::test]
    async fn test_panic_returns_fallback() {
        let value = manager(1)
            .execute_with_fallback(
                async {
                    if true {
                        panic!("specialist exploded");
                    }
                    Ok::<u32, String>(1)
                },
                42,
                "unit",
            )
            .await;
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_fallback_is_idempotent() {
        let manager = manager(1);
        let mut results = Vec::new();
        for _ in 0..3 {
            results.push(
                manager
                    .execute_with_fallback(async { Err::<Vec<u8>, _>("down") }, vec![1, 2, 3], "unit")
                    .await,
            );
        }
        assert!(results.iter().all(|r| r == &vec![1, 2, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = manager(3)
            .execute_with_retry("unit", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(InferenceError::Timeout)
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = manager(2)
            .execute_with_retry("unit", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(InferenceError::Transport("reset".into())) }
            })
            .await;
        assert_eq!(result, Err(InferenceError::Transport("reset".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = manager(5)
            .execute_with_retry("unit", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(InferenceError::Authentication("bad key".into())) }
            })
            .await;
        assert!(matches!(result, Err(InferenceError::Authentication(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}

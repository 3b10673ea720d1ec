//! Retry policy engine.
//!
//! Every networked call runs through [`retry`]. A call site passes the
//! caller's strategies, or the client defaults for the operation category
//! when the caller passed none (see [`strategies_or`]).
//!
//! ```rust,ignore
//! let strategies = [
//!     RetryStrategy::MaxTries(3),
//!     RetryStrategy::ExponentialBackoff {
//!         initial: Duration::from_millis(200),
//!         factor: 2,
//!         max: Duration::from_secs(5),
//!     },
//! ];
//! let vms = client.list_vms(&strategies).await?;
//! ```

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{EngineError, Result};

/// Attempt cap applied when no strategy bounds attempts or time.
pub const DEFAULT_MAX_TRIES: u32 = 5;

/// One knob of a retry policy. Several can be combined in one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Stop after this many attempts (0 is treated as 1).
    MaxTries(u32),
    /// Total budget across all attempts and waits.
    Timeout(Duration),
    /// Limit for a single attempt. A slower attempt fails as retryable.
    CallTimeout(Duration),
    /// Constant wait between attempts.
    FixedDelay(Duration),
    /// `initial * factor^(n-1)` before retry `n`, capped at `max`.
    ExponentialBackoff {
        initial: Duration,
        factor: u32,
        max: Duration,
    },
}

/// Use the caller's strategies unless there are none.
pub fn strategies_or<'a>(
    given: &'a [RetryStrategy],
    fallback: &'a [RetryStrategy],
) -> &'a [RetryStrategy] {
    if given.is_empty() {
        fallback
    } else {
        given
    }
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Severity of a retry diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Receives one progress message per attempt.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, severity: Severity, message: &str);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => debug!(target: "limiquantix_engine::retry", "{}", message),
            Severity::Info => info!(target: "limiquantix_engine::retry", "{}", message),
            Severity::Warn => warn!(target: "limiquantix_engine::retry", "{}", message),
            Severity::Error => error!(target: "limiquantix_engine::retry", "{}", message),
        }
    }
}

/// Keeps diagnostics in memory. Handy in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, severity: Severity, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((severity, message.to_string()));
        }
    }
}

// =============================================================================
// PLAN
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Backoff {
    None,
    Fixed(Duration),
    Exponential {
        initial: Duration,
        factor: u32,
        max: Duration,
    },
}

/// Strategies folded into one effective policy.
#[derive(Debug, Clone, Copy)]
struct Plan {
    max_tries: Option<u32>,
    deadline: Option<Duration>,
    call_timeout: Option<Duration>,
    backoff: Backoff,
}

fn tighter<T: Ord>(current: Option<T>, new: T) -> Option<T> {
    Some(match current {
        Some(current) => current.min(new),
        None => new,
    })
}

impl Plan {
    fn from_strategies(strategies: &[RetryStrategy]) -> Self {
        let mut plan = Plan {
            max_tries: None,
            deadline: None,
            call_timeout: None,
            backoff: Backoff::None,
        };

        for strategy in strategies {
            match *strategy {
                RetryStrategy::MaxTries(n) => plan.max_tries = tighter(plan.max_tries, n.max(1)),
                RetryStrategy::Timeout(d) => plan.deadline = tighter(plan.deadline, d),
                RetryStrategy::CallTimeout(d) => plan.call_timeout = tighter(plan.call_timeout, d),
                RetryStrategy::FixedDelay(d) => plan.backoff = Backoff::Fixed(d),
                RetryStrategy::ExponentialBackoff { initial, factor, max } => {
                    plan.backoff = Backoff::Exponential { initial, factor, max }
                }
            }
        }

        if plan.max_tries.is_none() && plan.deadline.is_none() {
            plan.max_tries = Some(DEFAULT_MAX_TRIES);
        }

        plan
    }

    /// Wait before the retry that follows attempt number `attempt` (1-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => d,
            Backoff::Exponential { initial, factor, max } => {
                let multiplier = factor.max(1).saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(multiplier).min(max)
            }
        }
    }

    /// Limit for the next attempt: the call timeout, clipped to what is left of the budget.
    fn attempt_limit(&self, elapsed: Duration) -> Option<Duration> {
        let remaining = self.deadline.map(|d| d.saturating_sub(elapsed));
        match (self.call_timeout, remaining) {
            (Some(call), Some(remaining)) => Some(call.min(remaining)),
            (call, remaining) => call.or(remaining),
        }
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Run `work` until it succeeds, fails terminally, or the budget runs out.
///
/// Terminal errors are returned unchanged after the attempt that produced
/// them. Running out of budget returns [`EngineError::Exhausted`] wrapping the
/// last retryable error, annotated with the number of attempts made.
pub async fn retry<T, F, Fut>(
    operation: &str,
    sink: &dyn DiagnosticSink,
    strategies: &[RetryStrategy],
    mut work: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let plan = Plan::from_strategies(strategies);
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        sink.record(Severity::Debug, &format!("{}: attempt {}", operation, attempt));

        let outcome = match plan.attempt_limit(started.elapsed()) {
            Some(limit) => match tokio::time::timeout(limit, work()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(EngineError::Timeout(format!(
                    "attempt {} did not finish within {:?}",
                    attempt, limit
                ))),
            },
            None => work().await,
        };

        let err = match outcome {
            Ok(value) => {
                sink.record(
                    Severity::Debug,
                    &format!("{}: attempt {} succeeded", operation, attempt),
                );
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            sink.record(
                Severity::Warn,
                &format!("{}: attempt {} failed with non-retryable error: {}", operation, attempt, err),
            );
            return Err(err);
        }

        let delay = plan.delay_after(attempt);
        let out_of_tries = plan.max_tries.is_some_and(|max| attempt >= max);
        let out_of_time = plan
            .deadline
            .is_some_and(|deadline| started.elapsed().saturating_add(delay) >= deadline);

        if out_of_tries || out_of_time {
            sink.record(
                Severity::Error,
                &format!("{}: giving up after {} attempt(s): {}", operation, attempt, err),
            );
            return Err(EngineError::Exhausted {
                operation: operation.to_string(),
                attempts: attempt,
                source: Box::new(err),
            });
        }

        sink.record(
            Severity::Info,
            &format!(
                "{}: attempt {} failed, retrying in {:?}: {}",
                operation, attempt, delay, err
            ),
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let sink = RecordingSink::new();

        let result = retry("listing VMs", &sink, &[RetryStrategy::MaxTries(5)], move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(EngineError::Transport("connection reset".into()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let entries = sink.entries();
        for attempt in 1..=3 {
            let started = format!("listing VMs: attempt {}", attempt);
            assert!(entries.iter().any(|(_, msg)| *msg == started));
        }
        assert!(entries
            .iter()
            .any(|(severity, msg)| *severity == Severity::Debug && msg.ends_with("attempt 3 succeeded")));
    }

    #[tokio::test]
    async fn test_terminal_error_short_circuits() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let err = retry("getting VM", &TracingSink, &[RetryStrategy::MaxTries(5)], move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(EngineError::NotFound("vm-1".into()))
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.attempts(), None);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let err = retry("updating NIC", &TracingSink, &[RetryStrategy::MaxTries(3)], move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(EngineError::Unidentified("HTTP 503".into()))
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.attempts(), Some(3));
        assert_eq!(err.kind(), ErrorKind::Unidentified);
    }

    #[tokio::test]
    async fn test_empty_list_is_still_bounded() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let err = retry("listing networks", &TracingSink, &[], move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(EngineError::Pending("not yet".into()))
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), DEFAULT_MAX_TRIES);
        assert_eq!(err.attempts(), Some(DEFAULT_MAX_TRIES));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_is_retryable() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let strategies = [
            RetryStrategy::MaxTries(2),
            RetryStrategy::CallTimeout(Duration::from_millis(50)),
        ];

        let result = retry("getting template", &TracingSink, &strategies, move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            Ok("done")
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_budget_stops_retrying() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let strategies = [
            RetryStrategy::Timeout(Duration::from_secs(1)),
            RetryStrategy::FixedDelay(Duration::from_millis(300)),
        ];

        let err = retry("listing templates", &TracingSink, &strategies, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(EngineError::Transport("refused".into()))
        })
        .await
        .unwrap_err();

        // Attempts at 0ms, 300ms, 600ms and 900ms; the next wait would cross the 1s budget.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(err.attempts(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_entity_is_polled_until_visible() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let strategies = [
            RetryStrategy::MaxTries(5),
            RetryStrategy::FixedDelay(Duration::from_millis(100)),
        ];

        let found = retry("waiting for NIC", &TracingSink, &strategies, move || async move {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(EngineError::Pending("NIC nic-1 not visible yet".into())),
                _ => Ok("nic-1"),
            }
        })
        .await
        .unwrap();

        assert_eq!(found, "nic-1");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_delay_with_timeout_is_exhausted() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let strategies = [
            RetryStrategy::Timeout(Duration::from_secs(1)),
            RetryStrategy::FixedDelay(Duration::MAX),
        ];

        let err = retry("listing networks", &TracingSink, &strategies, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(EngineError::Transport("refused".into()))
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.attempts(), Some(1));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_backoff_cap_with_timeout_is_exhausted() {
        let strategies = [
            RetryStrategy::Timeout(Duration::from_secs(5)),
            RetryStrategy::ExponentialBackoff {
                initial: Duration::from_secs(1),
                factor: u32::MAX,
                max: Duration::MAX,
            },
        ];

        let err = retry("listing networks", &TracingSink, &strategies, || async {
            Err::<(), _>(EngineError::Transport("refused".into()))
        })
        .await
        .unwrap_err();

        assert!(err.attempts().is_some());
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let plan = Plan::from_strategies(&[RetryStrategy::ExponentialBackoff {
            initial: Duration::from_millis(100),
            factor: 2,
            max: Duration::from_millis(500),
        }]);

        assert_eq!(plan.delay_after(1), Duration::from_millis(100));
        assert_eq!(plan.delay_after(2), Duration::from_millis(200));
        assert_eq!(plan.delay_after(3), Duration::from_millis(400));
        assert_eq!(plan.delay_after(4), Duration::from_millis(500));
        assert_eq!(plan.delay_after(40), Duration::from_millis(500));
    }

    #[test]
    fn test_most_restrictive_limits_win() {
        let plan = Plan::from_strategies(&[
            RetryStrategy::MaxTries(10),
            RetryStrategy::MaxTries(2),
            RetryStrategy::CallTimeout(Duration::from_secs(30)),
            RetryStrategy::CallTimeout(Duration::from_secs(5)),
        ]);
        assert_eq!(plan.max_tries, Some(2));
        assert_eq!(plan.call_timeout, Some(Duration::from_secs(5)));
        assert_eq!(plan.attempt_limit(Duration::ZERO), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_strategies_or_prefers_caller() {
        let fallback = [RetryStrategy::MaxTries(3)];
        let given = [RetryStrategy::MaxTries(1)];
        assert_eq!(strategies_or(&[], &fallback), &fallback);
        assert_eq!(strategies_or(&given, &fallback), &given);
    }
}

//! Wait - Poll-until-state engine
//!
//! Create/update/delete calls against the control plane return before the
//! resource has settled; the only way to observe progress is to describe
//! the resource again and read its status. `wait_for_state` runs that loop:
//! it invokes a caller-supplied refresh closure on a fixed cadence until
//! the resource reaches a target status, hits a configured fail status,
//! reports a status outside the expected sets, or the deadline passes.
//!
//! One invocation owns its own deadline and timer and blocks its task for
//! the duration of the wait. Callers needing concurrency run independent
//! invocations in parallel tasks; there is no shared state between waits.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::time::{Instant, sleep};

use crate::status::{Status, StatusSnapshot};

/// Error returned by a refresh closure
pub type RefreshError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one status poll
pub type RefreshResult = Result<StatusSnapshot, RefreshError>;

/// Polling policy for one wait invocation
///
/// Constructed per call site and discarded after one `wait_for_state`;
/// it owns no persistent state.
#[derive(Debug, Clone)]
pub struct WaitSpec {
    /// Statuses that keep the wait alive; empty means any non-target
    /// status is acceptable to keep waiting
    pub pending: Vec<Status>,
    /// Statuses that complete the wait successfully
    pub target: Vec<Status>,
    /// Statuses that abort the wait as failed; checked before `target`,
    /// so fail wins when a status appears in both. May be empty, in which
    /// case a stuck resource is only caught by the timeout.
    pub fail: Vec<Status>,
    /// Overall deadline for the wait, counted from invocation
    pub timeout: Duration,
    /// Startup grace period honored once before the first poll
    pub delay: Duration,
    /// Sleep between polls
    pub poll_interval: Duration,
    /// Lower bound on the poll interval, to avoid hot-looping on
    /// fast-responding backends
    pub min_poll_interval: Duration,
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

impl WaitSpec {
    /// Wait for any of `target`, with default timings and no pending or
    /// fail sets
    pub fn reach(target: impl IntoIterator<Item = Status>) -> Self {
        Self {
            pending: Vec::new(),
            target: target.into_iter().collect(),
            fail: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            delay: Duration::ZERO,
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_poll_interval: DEFAULT_MIN_POLL_INTERVAL,
        }
    }

    /// Wait for the remote object to be gone (deletion waits succeed on
    /// absence, not merely on an explicit "deleted" status)
    pub fn gone() -> Self {
        Self::reach([Status::Absent])
    }

    pub fn with_pending(mut self, pending: impl IntoIterator<Item = Status>) -> Self {
        self.pending = pending.into_iter().collect();
        self
    }

    pub fn with_fail(mut self, fail: impl IntoIterator<Item = Status>) -> Self {
        self.fail = fail.into_iter().collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_min_poll_interval(mut self, min_poll_interval: Duration) -> Self {
        self.min_poll_interval = min_poll_interval;
        self
    }

    fn interval(&self) -> Duration {
        self.poll_interval.max(self.min_poll_interval)
    }
}

/// Terminal failure of a wait
#[derive(Debug, Error)]
pub enum WaitError {
    /// The describe call failed with something other than not-found;
    /// never retried by the engine
    #[error("status query failed: {0}")]
    Refresh(#[source] RefreshError),

    /// The resource reached a configured fail status
    #[error("resource reached fail status '{0}'")]
    FailState(Status),

    /// The resource reported a status outside the target and pending sets
    #[error("unexpected status '{0}' while waiting")]
    UnexpectedState(Status),

    /// The deadline passed while the resource was still pending
    #[error("timed out waiting for target status, last seen '{last_status}'")]
    Timeout { last_status: Status },
}

/// Terminal outcome of one wait; exactly one variant is always returned
#[derive(Debug)]
pub enum WaitOutcome {
    /// A target status was observed; carries the final described
    /// properties, `None` when the target was absence
    Reached(Option<Value>),
    /// Deadline passed; carries the last observation for diagnostics
    TimedOut {
        last_status: Status,
        last_resource: Option<Value>,
    },
    Failed(WaitError),
}

impl WaitOutcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, Self::Reached(_))
    }

    /// Collapse the outcome into a Result, mapping a timeout onto
    /// [`WaitError::Timeout`]
    pub fn into_result(self) -> Result<Option<Value>, WaitError> {
        match self {
            Self::Reached(resource) => Ok(resource),
            Self::TimedOut { last_status, .. } => Err(WaitError::Timeout { last_status }),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Poll `refresh` until a terminal outcome per `spec`
///
/// Exactly one describe call happens per iteration. Only "still pending"
/// is retried; any refresh error ends the wait immediately (transport
/// retries, if any, belong to the remote client, not this engine).
pub async fn wait_for_state<F, Fut>(mut refresh: F, spec: &WaitSpec) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RefreshResult>,
{
    let deadline = Instant::now() + spec.timeout;

    if !spec.delay.is_zero() {
        sleep(spec.delay).await;
    }

    loop {
        let snapshot = match refresh().await {
            Ok(snapshot) => snapshot,
            Err(err) => return WaitOutcome::Failed(WaitError::Refresh(err)),
        };
        tracing::trace!(status = %snapshot.status, "poll");

        // Fail wins over target when a status appears in both sets
        if spec.fail.contains(&snapshot.status) {
            return WaitOutcome::Failed(WaitError::FailState(snapshot.status));
        }
        if spec.target.contains(&snapshot.status) {
            return WaitOutcome::Reached(snapshot.resource);
        }
        if !spec.pending.is_empty() && !spec.pending.contains(&snapshot.status) {
            return WaitOutcome::Failed(WaitError::UnexpectedState(snapshot.status));
        }
        if Instant::now() >= deadline {
            tracing::debug!(last_status = %snapshot.status, "wait deadline passed");
            return WaitOutcome::TimedOut {
                last_status: snapshot.status,
                last_resource: snapshot.resource,
            };
        }

        sleep(spec.interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    // Refresh closure that replays a fixed script of poll results and
    // counts how many describe calls were made. Polling past the end of
    // the script is a test failure.
    fn scripted(
        script: Vec<RefreshResult>,
    ) -> (
        impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = RefreshResult> + Send>>,
        Arc<AtomicUsize>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let script = Arc::new(Mutex::new(VecDeque::from(script)));
        let counter = calls.clone();
        let refresh = move || {
            let calls = counter.clone();
            let script = script.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                script
                    .lock()
                    .unwrap()
                    .pop_front()
                    .expect("polled past end of script")
            }) as std::pin::Pin<Box<dyn Future<Output = RefreshResult> + Send>>
        };
        (refresh, calls)
    }

    fn observed(status: &str) -> RefreshResult {
        Ok(StatusSnapshot {
            resource: Some(json!({ "Status": status })),
            status: Status::token(status),
        })
    }

    fn gone() -> RefreshResult {
        Ok(StatusSnapshot::absent())
    }

    fn fast(spec: WaitSpec) -> WaitSpec {
        spec.with_poll_interval(Duration::from_secs(1))
            .with_min_poll_interval(Duration::from_millis(1))
    }

    #[tokio::test(start_paused = true)]
    async fn reaches_target_after_pending_sequence() {
        let (refresh, calls) = scripted(vec![
            observed("Creating"),
            observed("Creating"),
            observed("Running"),
        ]);
        let spec = fast(
            WaitSpec::reach([Status::token("Running")])
                .with_pending([Status::token("Creating")])
                .with_timeout(Duration::from_secs(10)),
        );

        let started = Instant::now();
        let outcome = wait_for_state(refresh, &spec).await;

        assert!(outcome.is_reached());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two sleeps between the three polls
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn reached_carries_final_resource() {
        let (refresh, _) = scripted(vec![observed("Running")]);
        let spec = WaitSpec::reach([Status::token("Running")]);

        match wait_for_state(refresh, &spec).await {
            WaitOutcome::Reached(Some(resource)) => {
                assert_eq!(resource["Status"], json!("Running"));
            }
            other => panic!("expected Reached with resource, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deletion_wait_succeeds_on_absence() {
        let (refresh, calls) = scripted(vec![gone()]);
        let spec = WaitSpec::gone().with_pending([Status::token("Deleting")]);

        let started = Instant::now();
        match wait_for_state(refresh, &spec).await {
            WaitOutcome::Reached(resource) => assert!(resource.is_none()),
            other => panic!("expected Reached(None), got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_status_stops_polling_immediately() {
        // Script has no entries past the failure; another poll would panic
        let (refresh, calls) = scripted(vec![observed("Creating"), observed("CreateFailed")]);
        let spec = fast(
            WaitSpec::reach([Status::token("Running")])
                .with_pending([Status::token("Creating")])
                .with_fail([Status::token("CreateFailed")])
                .with_timeout(Duration::from_secs(60)),
        );

        match wait_for_state(refresh, &spec).await {
            WaitOutcome::Failed(WaitError::FailState(status)) => {
                assert_eq!(status, Status::token("CreateFailed"));
            }
            other => panic!("expected FailState, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_takes_precedence_over_target() {
        let (refresh, _) = scripted(vec![observed("Running")]);
        let spec = WaitSpec::reach([Status::token("Running")])
            .with_fail([Status::token("Running")]);

        match wait_for_state(refresh, &spec).await {
            WaitOutcome::Failed(WaitError::FailState(_)) => {}
            other => panic!("expected FailState, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_status_fails_rather_than_looping() {
        let (refresh, calls) = scripted(vec![observed("Creating"), observed("Migrating")]);
        let spec = fast(
            WaitSpec::reach([Status::token("Running")])
                .with_pending([Status::token("Creating")])
                .with_timeout(Duration::from_secs(60)),
        );

        match wait_for_state(refresh, &spec).await {
            WaitOutcome::Failed(WaitError::UnexpectedState(status)) => {
                assert_eq!(status, Status::token("Migrating"));
            }
            other => panic!("expected UnexpectedState, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pending_set_accepts_any_interim_status() {
        let (refresh, _) = scripted(vec![
            observed("Allocating"),
            observed("Bootstrapping"),
            observed("Running"),
        ]);
        let spec = fast(
            WaitSpec::reach([Status::token("Running")]).with_timeout(Duration::from_secs(30)),
        );

        assert!(wait_for_state(refresh, &spec).await.is_reached());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_polls_at_most_once() {
        let (refresh, calls) = scripted(vec![observed("Creating")]);
        let spec = fast(
            WaitSpec::reach([Status::token("Running")])
                .with_pending([Status::token("Creating")])
                .with_timeout(Duration::ZERO),
        );

        match wait_for_state(refresh, &spec).await {
            WaitOutcome::TimedOut { last_status, .. } => {
                assert_eq!(last_status, Status::token("Creating"));
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_still_reaches_on_first_observation() {
        let (refresh, calls) = scripted(vec![observed("Running")]);
        let spec = WaitSpec::reach([Status::token("Running")]).with_timeout(Duration::ZERO);

        assert!(wait_for_state(refresh, &spec).await.is_reached());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_within_one_interval_of_deadline() {
        let (refresh, calls) = scripted((0..7).map(|_| observed("Creating")).collect());
        let spec = WaitSpec::reach([Status::token("Running")])
            .with_pending([Status::token("Creating")])
            .with_timeout(Duration::from_secs(10))
            .with_poll_interval(Duration::from_secs(2));

        let started = Instant::now();
        let outcome = wait_for_state(refresh, &spec).await;
        let elapsed = started.elapsed();

        match outcome {
            WaitOutcome::TimedOut {
                last_status,
                last_resource,
            } => {
                assert_eq!(last_status, Status::token("Creating"));
                assert!(last_resource.is_some());
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(12));
        // Polls at t=0,2,4,6,8,10
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_error_is_fatal_without_retry() {
        let (refresh, calls) = scripted(vec![Err("connection reset".into())]);
        let spec = fast(WaitSpec::reach([Status::token("Running")]));

        match wait_for_state(refresh, &spec).await {
            WaitOutcome::Failed(WaitError::Refresh(err)) => {
                assert_eq!(err.to_string(), "connection reset");
            }
            other => panic!("expected Refresh error, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_delay_is_honored_once() {
        let (refresh, _) = scripted(vec![observed("Running")]);
        let spec = WaitSpec::reach([Status::token("Running")]).with_delay(Duration::from_secs(3));

        let started = Instant::now();
        assert!(wait_for_state(refresh, &spec).await.is_reached());
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn min_poll_interval_floors_the_cadence() {
        let (refresh, _) = scripted(vec![observed("Creating"), observed("Running")]);
        let spec = WaitSpec::reach([Status::token("Running")])
            .with_pending([Status::token("Creating")])
            .with_poll_interval(Duration::ZERO)
            .with_min_poll_interval(Duration::from_secs(1));

        let started = Instant::now();
        assert!(wait_for_state(refresh, &spec).await.is_reached());
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn into_result_maps_timeout_to_error() {
        let (refresh, _) = scripted(vec![observed("Creating")]);
        let spec = fast(
            WaitSpec::reach([Status::token("Running")])
                .with_pending([Status::token("Creating")])
                .with_timeout(Duration::ZERO),
        );

        let err = wait_for_state(refresh, &spec)
            .await
            .into_result()
            .unwrap_err();
        match err {
            WaitError::Timeout { last_status } => {
                assert_eq!(last_status, Status::token("Creating"));
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
    }
}

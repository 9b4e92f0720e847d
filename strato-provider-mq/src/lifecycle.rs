//! Lifecycle - Per-resource polling policy as data
//!
//! Each resource type declares how its readiness is observed (which
//! property carries the status, or which property being populated means
//! "exists") and which statuses mean creating, available, deleting, or
//! failed. Waits are then built from this data; there is one wait engine,
//! not one wait function per resource.

use std::time::Duration;

use strato_core::status::{Status, StatusSnapshot, StatusSource};
use strato_core::wait::{WaitOutcome, WaitSpec, wait_for_state};

use crate::client::ControlApi;

/// Polling policy for one resource type
#[derive(Debug, Clone)]
pub struct Lifecycle {
    /// Control plane type name (e.g., "mq_topic")
    pub type_name: &'static str,
    /// How to read the status token from described properties
    pub status: StatusSource,
    /// Statuses observed while the resource is being created
    pub creating: Vec<Status>,
    /// Statuses meaning the resource is ready for use
    pub available: Vec<Status>,
    /// Statuses observed while the resource is being torn down
    pub deleting: Vec<Status>,
    /// Statuses meaning the operation has failed remotely. May be empty:
    /// some types report no failure status and a stuck resource is only
    /// caught by the timeout.
    pub fail: Vec<Status>,
    pub create_timeout: Duration,
    pub delete_timeout: Duration,
}

impl Lifecycle {
    /// Wait spec for a freshly created resource to become available
    pub fn creation_wait(&self) -> WaitSpec {
        WaitSpec::reach(self.available.clone())
            .with_pending(self.creating.clone())
            .with_fail(self.fail.clone())
            .with_timeout(self.create_timeout)
    }

    /// Wait spec for an updated resource to settle back to available
    ///
    /// Interim statuses during updates are not catalogued per type, so
    /// the pending set is left open.
    pub fn update_wait(&self) -> WaitSpec {
        WaitSpec::reach(self.available.clone())
            .with_fail(self.fail.clone())
            .with_timeout(self.create_timeout)
    }

    /// Wait spec for the remote object to disappear
    ///
    /// Succeeds on absence: many backends report not-found rather than a
    /// terminal "deleted" status. Every known still-exists status keeps
    /// the wait alive.
    pub fn deletion_wait(&self) -> WaitSpec {
        let mut pending = self.deleting.clone();
        pending.extend(self.available.iter().cloned());
        pending.extend(self.creating.iter().cloned());
        WaitSpec::gone()
            .with_pending(pending)
            .with_timeout(self.delete_timeout)
    }
}

/// Poll the control plane until `spec` resolves for one resource
///
/// A not-found describe becomes an absent snapshot, not an error; any
/// other client error ends the wait immediately.
pub async fn wait_for<C: ControlApi>(
    client: &C,
    lifecycle: &Lifecycle,
    identifier: &str,
    spec: &WaitSpec,
) -> WaitOutcome {
    let refresh = move || async move {
        match client.describe(lifecycle.type_name, identifier).await {
            Ok(properties) => Ok(StatusSnapshot::observed(properties, &lifecycle.status)),
            Err(err) if err.is_not_found() => Ok(StatusSnapshot::absent()),
            Err(err) => Err(err.into()),
        }
    };
    wait_for_state(refresh, spec).await
}

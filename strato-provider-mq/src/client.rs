//! Control plane client boundary
//!
//! The remote control plane is an external collaborator reached through
//! this trait. Errors must distinguish "not found" from everything else:
//! absence is interpreted by the wait layer (it is success when waiting
//! for deletion), while any other failure aborts the current operation.
//! Transport-level retries, if any, belong to implementations of this
//! trait, not to the callers.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur when calling the control plane
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote object does not exist
    #[error("{type_name} '{identifier}' not found")]
    NotFound {
        type_name: String,
        identifier: String,
    },

    /// Any other remote failure; immediately fatal to the current wait
    #[error("remote call failed: {0}")]
    Remote(String),
}

impl ClientError {
    pub fn not_found(type_name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            type_name: type_name.into(),
            identifier: identifier.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for control plane calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Uniform control plane interface
///
/// Resources are addressed by type name plus the remote-assigned opaque
/// identifier. `describe` is a pure query with no side effects on the
/// remote object.
#[async_trait]
pub trait ControlApi: Send + Sync {
    /// Describe one resource, returning its current properties
    async fn describe(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> ClientResult<Map<String, Value>>;

    /// Submit a create; returns the remote-assigned identifier. The
    /// resource may still be converging when this returns.
    async fn create(
        &self,
        type_name: &str,
        desired: Map<String, Value>,
    ) -> ClientResult<String>;

    /// Submit an in-place update; the resource may still be converging
    /// when this returns
    async fn update(
        &self,
        type_name: &str,
        identifier: &str,
        patch: Map<String, Value>,
    ) -> ClientResult<()>;

    /// Submit a delete; the remote object may linger in a deleting status
    /// before disappearing
    async fn delete(&self, type_name: &str, identifier: &str) -> ClientResult<()>;
}

//! Strato MQ Provider
//!
//! Provider for a message-queue control plane (instances, topics, consumer
//! groups, ACLs). The control plane settles create/update/delete operations
//! asynchronously; every mutation here runs a poll-until-state wait driven
//! by per-resource lifecycle data rather than per-resource wait code.

pub mod client;
pub mod config;
pub mod lifecycle;
pub mod provider;
pub mod resources;

pub use client::{ClientError, ClientResult, ControlApi};
pub use config::MqConfig;
pub use provider::MqProvider;

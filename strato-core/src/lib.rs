//! Strato Core
//!
//! Core library for a declarative infrastructure tool: the provider
//! abstraction plus the poll-until-state engine that bridges synchronous
//! resource operations and asynchronously-converging cloud control planes.

pub mod provider;
pub mod resource;
pub mod status;
pub mod wait;

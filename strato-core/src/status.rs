//! Status - Observed resource status and how to extract it
//!
//! Control planes report readiness inconsistently: most resources carry an
//! explicit status field, some numeric, and some have no status at all -
//! the only observable signal is that a particular field got populated.
//! `StatusSource` captures both accessor shapes as data, and `Status` is
//! the tagged token a poll resolves to.

use serde_json::{Map, Value};

/// Legacy rendering of [`Status::FieldSet`], kept for log/diagnostic
/// compatibility with the string convention this type replaces.
pub const FIELD_SET_TOKEN: &str = "#CHECKSET";

/// One observed status token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    /// Resource absent, or no status reported (the empty token)
    Absent,
    /// Presence-check accessor found its field populated
    FieldSet,
    /// Provider-reported status string
    Token(String),
}

impl Status {
    /// Build a status from a raw token; the empty string maps to `Absent`
    pub fn token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.is_empty() {
            Self::Absent
        } else {
            Self::Token(token)
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => Ok(()),
            Self::FieldSet => write!(f, "{}", FIELD_SET_TOKEN),
            Self::Token(token) => write!(f, "{}", token),
        }
    }
}

/// How to extract a status token from described resource properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSource {
    /// Read the named property's value as the status token
    Field(String),
    /// Report [`Status::FieldSet`] when the named property is populated,
    /// else the direct (empty) value - for resources whose only readiness
    /// signal is "this field exists"
    Presence(String),
}

impl StatusSource {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn presence(name: impl Into<String>) -> Self {
        Self::Presence(name.into())
    }

    /// Resolve the status token from a described property map
    pub fn resolve(&self, properties: &Map<String, Value>) -> Status {
        match self {
            Self::Field(name) => match properties.get(name.as_str()) {
                Some(Value::String(s)) => Status::token(s.clone()),
                // Some backends report numeric status codes
                Some(Value::Number(n)) => Status::token(n.to_string()),
                _ => Status::Absent,
            },
            Self::Presence(name) => {
                if is_populated(properties.get(name.as_str())) {
                    Status::FieldSet
                } else {
                    Status::Absent
                }
            }
        }
    }
}

fn is_populated(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

/// The result of one poll against a remote resource
///
/// Produced and discarded each poll cycle; never cached across polls.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Described properties, absent when the remote object does not exist
    pub resource: Option<Value>,
    pub status: Status,
}

impl StatusSnapshot {
    /// Snapshot for a remote object that does not exist
    pub fn absent() -> Self {
        Self {
            resource: None,
            status: Status::Absent,
        }
    }

    /// Snapshot for a described object, resolving status via `source`
    pub fn observed(properties: Map<String, Value>, source: &StatusSource) -> Self {
        let status = source.resolve(&properties);
        Self {
            resource: Some(Value::Object(properties)),
            status,
        }
    }
}

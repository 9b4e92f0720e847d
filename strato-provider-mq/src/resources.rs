//! Resource catalogue - lifecycles for the message-queue family
//!
//! The control plane is inconsistent across types: instances and topics
//! carry an explicit `Status` property, while consumer groups and ACLs
//! expose no status at all - the only readiness signal is that the
//! remote-assigned field got populated, observed via a presence check.

use std::time::Duration;

use strato_core::status::{Status, StatusSource};

use crate::lifecycle::Lifecycle;

fn tokens(values: &[&str]) -> Vec<Status> {
    values.iter().map(|s| Status::token(*s)).collect()
}

/// Message-queue instance: the long-lived broker deployment
pub fn instance() -> Lifecycle {
    Lifecycle {
        type_name: "mq_instance",
        status: StatusSource::field("Status"),
        creating: tokens(&["Creating", "Deploying"]),
        available: tokens(&["Running"]),
        deleting: tokens(&["Releasing"]),
        fail: tokens(&["CreateFailed"]),
        create_timeout: Duration::from_secs(40 * 60),
        delete_timeout: Duration::from_secs(20 * 60),
    }
}

/// Topic within an instance
pub fn topic() -> Lifecycle {
    Lifecycle {
        type_name: "mq_topic",
        status: StatusSource::field("Status"),
        creating: tokens(&["Creating"]),
        available: tokens(&["Running"]),
        deleting: tokens(&["Deleting"]),
        // The control plane reports no failure status for topics; a stuck
        // topic is only caught by the timeout
        fail: Vec::new(),
        create_timeout: Duration::from_secs(10 * 60),
        delete_timeout: Duration::from_secs(10 * 60),
    }
}

/// Consumer group: no status property; ready once `GroupId` is assigned
pub fn consumer_group() -> Lifecycle {
    Lifecycle {
        type_name: "mq_consumer_group",
        status: StatusSource::presence("GroupId"),
        creating: Vec::new(),
        available: vec![Status::FieldSet],
        deleting: Vec::new(),
        fail: Vec::new(),
        create_timeout: Duration::from_secs(5 * 60),
        delete_timeout: Duration::from_secs(5 * 60),
    }
}

/// SASL ACL entry: no status property; ready once `Username` is populated
pub fn acl() -> Lifecycle {
    Lifecycle {
        type_name: "mq_acl",
        status: StatusSource::presence("Username"),
        creating: Vec::new(),
        available: vec![Status::FieldSet],
        deleting: Vec::new(),
        fail: Vec::new(),
        create_timeout: Duration::from_secs(5 * 60),
        delete_timeout: Duration::from_secs(5 * 60),
    }
}

/// Look up the lifecycle for a resource type name
pub fn for_type(resource_type: &str) -> Option<Lifecycle> {
    match resource_type {
        "mq_instance" => Some(instance()),
        "mq_topic" => Some(topic()),
        "mq_consumer_group" => Some(consumer_group()),
        "mq_acl" => Some(acl()),
        _ => None,
    }
}

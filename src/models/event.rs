// src/models/event.rs

//! Change events and their queue deliveries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A module was published (or otherwise changed) upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Module name
    pub name: String,

    /// When the change was pushed to the queue
    pub pushed_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(name: impl Into<String>, pushed_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            pushed_at,
        }
    }

    /// Create an event stamped with the current time.
    pub fn now(name: impl Into<String>) -> Self {
        Self::new(name, Utc::now())
    }
}

/// One message received from the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    /// Queue-assigned identifier
    pub id: String,

    /// The carried change event
    pub event: ChangeEvent,

    /// Number of times this delivery was rejected so far
    #[serde(default)]
    pub attempts: u32,

    /// Not handed out before this instant
    pub available_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(id: impl Into<String>, event: ChangeEvent) -> Self {
        Self {
            id: id.into(),
            event,
            attempts: 0,
            available_at: Utc::now(),
        }
    }

    /// Whether the delivery may be handed to a consumer at `now`.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.available_at <= now
    }
}

//! Delivery queue abstraction.
//!
//! A delivery handed out by `receive` stays owned by the consumer until it is
//! either acknowledged (done, never redelivered) or rejected (left to the
//! queue's redelivery policy).

pub mod spool;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Delivery;

pub use spool::SpoolQueue;

#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Claim the next available delivery, or `None` if nothing is available now.
    async fn receive(&self) -> Result<Option<Delivery>>;

    /// Acknowledge a delivery; it is removed from the queue.
    async fn ack(&self, delivery: &Delivery) -> Result<()>;

    /// Reject a delivery; the queue decides when (or whether) to redeliver it.
    async fn reject(&self, delivery: &Delivery) -> Result<()>;
}

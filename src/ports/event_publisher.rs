//! EventPublisher port - Interface for publishing gateway events.
//!
//! Publishing is fire-and-forget: the caller never waits for listeners and
//! never learns whether anyone was listening.

use crate::domain::events::GatewayEvent;

/// Port for publishing gateway events.
///
/// Implementations must ensure:
/// - `publish` returns without awaiting any listener
/// - Publishing with zero subscribers is not an error
/// - A slow or failing listener never affects the caller
pub trait EventPublisher: Send + Sync {
    /// Publish a single event to every current subscriber.
    fn publish(&self, event: GatewayEvent);
}

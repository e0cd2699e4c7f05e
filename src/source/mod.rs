//! Live channel abstraction for receiving cluster snapshots.
//!
//! A [`LiveChannel`] is the single logical connection to the snapshot
//! producer. Implementations run their I/O on background tasks and expose
//! inbound events through a non-blocking [`LiveChannel::poll`], so the UI
//! loop never waits on the network.

mod channel;
mod file;
mod snapshot;
mod stream;
mod websocket;
pub mod wire;

pub use channel::{ChannelSource, ProducerEnd};
pub use file::FileSource;
pub use snapshot::{
    BreathingState, Category, Component, ComponentMap, Flow, FlowKind, HealthView, NumericLeaf,
    Snapshot, TrafficMetrics, TrafficOverview, TrafficView,
};
pub use stream::StreamChannel;
pub use websocket::WebSocketChannel;

use std::fmt::Debug;

use serde_json::Value;

use crate::error::ChannelError;

/// Inbound events from the snapshot producer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The channel has been established.
    Connected,
    /// An established channel was lost.
    Disconnected,
    /// The channel could not be established.
    ConnectError(String),
    /// A full snapshot payload, not yet normalized.
    ClusterUpdate(Value),
}

/// Outbound requests to the snapshot producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// Ask the producer for a fresh snapshot.
    RequestUpdate,
}

/// Trait for the live-update channel to the cluster-state producer.
///
/// # Example
///
/// ```
/// use sanctuary_watch::source::{ChannelEvent, ChannelSource, LiveChannel};
///
/// let (producer, mut channel) = ChannelSource::create("in-process");
/// producer.send(ChannelEvent::Connected);
/// assert_eq!(channel.poll(), Some(ChannelEvent::Connected));
/// ```
pub trait LiveChannel: Send + Debug {
    /// Poll for the next inbound event.
    ///
    /// Returns `None` when nothing is pending. This method must not block.
    fn poll(&mut self) -> Option<ChannelEvent>;

    /// Send a `request_update` to the producer.
    fn request_update(&mut self) -> Result<(), ChannelError>;

    /// Returns a human-readable description of the channel.
    ///
    /// Used for display in the status bar.
    fn description(&self) -> &str;
}

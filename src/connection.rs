//! Connection lifecycle for the live channel.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::source::{ChannelEvent, LiveChannel};

/// Lifecycle state of the live channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connecting,
    Connected,
    Disconnected,
    /// The channel could not be established.
    Error(String),
}

impl ConnectionPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionPhase::Connecting => "Connecting...",
            ConnectionPhase::Connected => "Connected",
            ConnectionPhase::Disconnected | ConnectionPhase::Error(_) => "Disconnected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionPhase::Connected)
    }
}

/// Owns the live channel and its phase.
///
/// Transport failures only ever change the phase. Nothing here retries;
/// whatever reconnection the transport does on its own is reflected as it
/// happens.
#[derive(Debug)]
pub struct ConnectionManager {
    channel: Box<dyn LiveChannel>,
    phase: ConnectionPhase,
}

impl ConnectionManager {
    pub fn new(channel: Box<dyn LiveChannel>) -> Self {
        Self {
            channel,
            phase: ConnectionPhase::Connecting,
        }
    }

    pub fn phase(&self) -> &ConnectionPhase {
        &self.phase
    }

    pub fn description(&self) -> &str {
        self.channel.description()
    }

    /// Next pending event from the channel, without blocking.
    pub fn poll(&mut self) -> Option<ChannelEvent> {
        self.channel.poll()
    }

    /// Apply one channel event.
    ///
    /// Returns the raw payload when the event carried a snapshot.
    pub fn handle_event(&mut self, event: ChannelEvent) -> Option<Value> {
        match event {
            ChannelEvent::Connected => {
                info!("Connected ({})", self.channel.description());
                self.phase = ConnectionPhase::Connected;
                self.request_snapshot();
                None
            }
            ChannelEvent::Disconnected => {
                info!("Disconnected ({})", self.channel.description());
                self.phase = ConnectionPhase::Disconnected;
                None
            }
            ChannelEvent::ConnectError(message) => {
                warn!("Connection error: {}", message);
                self.phase = ConnectionPhase::Error(message);
                None
            }
            ChannelEvent::ClusterUpdate(raw) => Some(raw),
        }
    }

    /// Ask the producer for a fresh snapshot.
    ///
    /// Skipped while not connected. Returns whether a request went out.
    pub fn request_snapshot(&mut self) -> bool {
        if !self.phase.is_connected() {
            debug!("Snapshot request skipped while {:?}", self.phase);
            return false;
        }
        match self.channel.request_update() {
            Ok(()) => true,
            Err(e) => {
                warn!("Snapshot request failed: {}", e);
                false
            }
        }
    }
}

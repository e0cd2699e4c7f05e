//! Channel-based live channel.
//!
//! Connects the dashboard to an in-process producer through a pair of tokio
//! channels. Useful for embedding the dashboard next to a producer and for
//! tests that need to script the producer side.

use tokio::sync::mpsc;

use super::{ChannelEvent, LiveChannel, Outbound};
use crate::error::ChannelError;

/// The producer's half of a [`ChannelSource`] pair.
#[derive(Debug)]
pub struct ProducerEnd {
    events: mpsc::UnboundedSender<ChannelEvent>,
    requests: mpsc::UnboundedReceiver<Outbound>,
}

impl ProducerEnd {
    /// Push an event to the dashboard. Returns false once the dashboard is gone.
    pub fn send(&self, event: ChannelEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Take the next pending outbound request, if any.
    pub fn try_next_request(&mut self) -> Option<Outbound> {
        self.requests.try_recv().ok()
    }

    /// Wait for the next outbound request.
    pub async fn next_request(&mut self) -> Option<Outbound> {
        self.requests.recv().await
    }
}

/// A live channel fed by an in-process producer.
#[derive(Debug)]
pub struct ChannelSource {
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    requests: mpsc::UnboundedSender<Outbound>,
    description: String,
}

impl ChannelSource {
    /// Create a connected pair.
    ///
    /// Returns `(producer, source)`: the producer pushes [`ChannelEvent`]s and
    /// receives requests, the source is handed to the dashboard.
    pub fn create(source_description: &str) -> (ProducerEnd, Self) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let producer = ProducerEnd {
            events: events_tx,
            requests: requests_rx,
        };
        let source = Self {
            events: events_rx,
            requests: requests_tx,
            description: format!("channel: {}", source_description),
        };
        (producer, source)
    }
}

impl LiveChannel for ChannelSource {
    fn poll(&mut self) -> Option<ChannelEvent> {
        self.events.try_recv().ok()
    }

    fn request_update(&mut self) -> Result<(), ChannelError> {
        self.requests.send(Outbound::RequestUpdate).map_err(|_| ChannelError::Closed)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_source_poll() {
        let (producer, mut source) = ChannelSource::create("test");

        assert!(source.poll().is_none());

        assert!(producer.send(ChannelEvent::Connected));
        assert!(producer.send(ChannelEvent::ClusterUpdate(json!({ "agents": {} }))));

        assert_eq!(source.poll(), Some(ChannelEvent::Connected));
        assert!(matches!(source.poll(), Some(ChannelEvent::ClusterUpdate(_))));
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_channel_source_requests_reach_producer() {
        let (mut producer, mut source) = ChannelSource::create("test");

        source.request_update().unwrap();
        assert_eq!(producer.try_next_request(), Some(Outbound::RequestUpdate));
        assert!(producer.try_next_request().is_none());
    }

    #[test]
    fn test_channel_source_closed_producer() {
        let (producer, mut source) = ChannelSource::create("test");
        drop(producer);

        assert!(matches!(source.request_update(), Err(ChannelError::Closed)));
        assert!(source.poll().is_none());
        assert_eq!(source.description(), "channel: test");
    }
}

//! # sanctuary-watch
//!
//! A live terminal dashboard and library for watching an agent cluster.
//!
//! A single producer pushes full cluster snapshots (agents, models, memory
//! systems, ingress, telemetry, traffic flows and health) over a live
//! channel. Each snapshot replaces the previous one wholesale and triggers a
//! full render pass; a side channel fetches problematic pods once per pass.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Application                            │
//! │  ┌────────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐     │
//! │  │ connection │──▶│   app    │──▶│   data   │──▶│    ui    │     │
//! │  │  (phase)   │   │ (events) │   │(projection)  │ (render) │     │
//! │  └─────┬──────┘   └────┬─────┘   └──────────┘   └──────────┘     │
//! │        │               │                                         │
//! │        ▼               ▼                                         │
//! │  ┌──────────┐    ┌───────────┐                                   │
//! │  │  source  │    │ PodFetcher│◀── GET /api/pod-states            │
//! │  │ (input)  │    └───────────┘                                   │
//! │  └──────────┘◀── WebSocketChannel | StreamChannel | FileSource   │
//! │                  | ChannelSource                                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: The [`LiveChannel`] trait, the wire codec, and channel
//!   implementations for WebSocket, raw streams, files and in-process use
//! - **[`connection`]**: Tracks the connection phase and asks for a
//!   snapshot as soon as the channel comes up
//! - **[`data`]**: Snapshot storage and the pure projections derived from it
//! - **[`app`]**: The message loop controller; one [`AppEvent`] at a time
//! - **[`ui`]**: Terminal rendering using ratatui, two-phase for the agent
//!   graph and its traffic overlay
//! - **[`config`]** and **[`logging`]**: Layered settings and file logging
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch the default WebSocket endpoint
//! sanctuary-watch
//!
//! # Watch a specific endpoint without the pod side channel
//! sanctuary-watch --url "ws://cluster.local:5001/socket.io/?EIO=4&transport=websocket" --no-pods
//!
//! # Replay a snapshot file
//! sanctuary-watch --file snapshot.json
//! ```
//!
//! ### As a library with an in-process channel
//!
//! ```
//! use sanctuary_watch::{App, ChannelEvent, ChannelSource};
//! use serde_json::json;
//! use std::time::Instant;
//!
//! let (producer, source) = ChannelSource::create("in-process");
//! let mut app = App::new(Box::new(source));
//!
//! producer.send(ChannelEvent::Connected);
//! producer.send(ChannelEvent::ClusterUpdate(json!({
//!     "agents": { "clara": { "name": "Clara", "ready": true } }
//! })));
//! for event in app.poll_events(Instant::now()) {
//!     app.handle(event);
//! }
//! assert_eq!(app.agent_cards().len(), 1);
//! ```
//!
//! ### As a library with stream source (TCP, etc.)
//!
//! ```no_run
//! use sanctuary_watch::{App, StreamChannel};
//!
//! # tokio_test::block_on(async {
//! let (client, _server) = tokio::io::duplex(4096);
//! let channel = StreamChannel::spawn(client, "example");
//! let app = App::new(Box::new(channel));
//! # });
//! ```

pub mod app;
pub mod config;
pub mod connection;
pub mod data;
pub mod error;
pub mod events;
pub mod logging;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, AppEvent, RefreshHandle};
pub use config::Settings;
pub use connection::{ConnectionManager, ConnectionPhase};
pub use data::{DashboardView, PodStateReport, SnapshotStore};
pub use error::{ChannelError, FetchError, WireError};
pub use source::{
    ChannelEvent, ChannelSource, FileSource, LiveChannel, Snapshot, StreamChannel,
    WebSocketChannel,
};

//! WebSocket live channel.
//!
//! The default transport: a Socket.IO client over a single WebSocket
//! connection (Engine.IO v4, no polling fallback). The client joins the
//! default namespace when the server opens the session, answers pings,
//! and sends `request_update` as a Socket.IO event. See [`super::wire`]
//! for the packet exchange.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::wire::{decode_packet, encode_socketio_request_update, Packet, JOIN_NAMESPACE, PONG};
use super::{ChannelEvent, LiveChannel, Outbound};
use crate::error::ChannelError;

/// A live channel over a WebSocket connection.
///
/// Connection is attempted once, in the background. `Connected` is reported
/// once the server accepts the namespace join. Losing the connection reports
/// `Disconnected`; reconnecting is left to the operator.
#[derive(Debug)]
pub struct WebSocketChannel {
    events: mpsc::Receiver<ChannelEvent>,
    outbound: mpsc::Sender<Outbound>,
    description: String,
}

impl WebSocketChannel {
    /// Start connecting to `url`
    /// (e.g. `ws://127.0.0.1:5001/socket.io/?EIO=4&transport=websocket`).
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(url: &str) -> Self {
        let (events_tx, events_rx) = mpsc::channel(16);
        let (outbound_tx, outbound_rx) = mpsc::channel(8);
        let target = url.to_string();

        tokio::spawn(async move {
            run(target, events_tx, outbound_rx).await;
        });

        Self {
            events: events_rx,
            outbound: outbound_tx,
            description: format!("ws: {}", url),
        }
    }
}

/// What to do with one packet: an optional reply frame and an optional
/// event for the dashboard.
fn respond(packet: Packet) -> (Option<&'static str>, Option<ChannelEvent>) {
    match packet {
        Packet::Open => (Some(JOIN_NAMESPACE), None),
        Packet::Ping => (Some(PONG), None),
        Packet::Joined => (None, Some(ChannelEvent::Connected)),
        Packet::Event(event) => (None, Some(event)),
        Packet::Close | Packet::Left => (None, Some(ChannelEvent::Disconnected)),
        Packet::Refused(message) => (None, Some(ChannelEvent::ConnectError(message))),
        Packet::Ignored => (None, None),
    }
}

async fn run(
    url: String,
    events: mpsc::Sender<ChannelEvent>,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    let mut ws = match connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            warn!("WebSocket connect to {} failed: {}", url, e);
            let _ = events.send(ChannelEvent::ConnectError(e.to_string())).await;
            return;
        }
    };
    info!("WebSocket open to {}", url);

    loop {
        tokio::select! {
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let (reply, event) = match decode_packet(&text) {
                        Ok(packet) => respond(packet),
                        Err(e) => {
                            debug!("Ignoring frame: {}", e);
                            continue;
                        }
                    };

                    if let Some(reply) = reply {
                        if let Err(e) = ws.send(Message::Text(reply.to_string())).await {
                            warn!("WebSocket send failed: {}", e);
                            let _ = events.send(ChannelEvent::Disconnected).await;
                            break;
                        }
                    }

                    if let Some(event) = event {
                        let finished = matches!(
                            event,
                            ChannelEvent::Disconnected | ChannelEvent::ConnectError(_)
                        );
                        if event == ChannelEvent::Connected {
                            info!("Joined namespace on {}", url);
                        }
                        if events.send(event).await.is_err() || finished {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    let _ = events.send(ChannelEvent::Disconnected).await;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error: {}", e);
                    let _ = events.send(ChannelEvent::Disconnected).await;
                    break;
                }
            },
            request = outbound.recv() => match request {
                Some(Outbound::RequestUpdate) => {
                    let frame = encode_socketio_request_update();
                    if let Err(e) = ws.send(Message::Text(frame)).await {
                        warn!("WebSocket send failed: {}", e);
                        let _ = events.send(ChannelEvent::Disconnected).await;
                        break;
                    }
                }
                None => break,
            },
        }
    }

    let _ = ws.close(None).await;
}

impl LiveChannel for WebSocketChannel {
    fn poll(&mut self) -> Option<ChannelEvent> {
        self.events.try_recv().ok()
    }

    fn request_update(&mut self) -> Result<(), ChannelError> {
        self.outbound.try_send(Outbound::RequestUpdate).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ChannelError::Backlogged,
            mpsc::error::TrySendError::Closed(_) => ChannelError::Closed,
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::time::{sleep, Duration};

    async fn next_text<S>(ws: &mut S) -> String
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => text,
            other => panic!("expected a text frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_socketio_session_with_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            // Engine.IO open, then wait for the namespace join
            ws.send(Message::Text(
                r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#
                    .to_string(),
            ))
            .await
            .unwrap();
            assert_eq!(next_text(&mut ws).await, "40");
            ws.send(Message::Text(r#"40{"sid":"xyz"}"#.to_string()))
                .await
                .unwrap();

            // Ping must be answered before the server hears anything else
            ws.send(Message::Text("2".to_string())).await.unwrap();
            assert_eq!(next_text(&mut ws).await, "3");

            assert_eq!(next_text(&mut ws).await, r#"42["request_update"]"#);
            ws.send(Message::Text(
                r#"42["cluster_update",{"agents":{}}]"#.to_string(),
            ))
            .await
            .unwrap();
            ws.close(None).await.unwrap();
        });

        let mut channel = WebSocketChannel::connect(&format!("ws://{}", addr));
        sleep(Duration::from_millis(100)).await;
        assert_eq!(channel.poll(), Some(ChannelEvent::Connected));

        channel.request_update().unwrap();
        sleep(Duration::from_millis(100)).await;

        assert_eq!(
            channel.poll(),
            Some(ChannelEvent::ClusterUpdate(json!({ "agents": {} })))
        );
        server.await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(channel.poll(), Some(ChannelEvent::Disconnected));
    }

    #[tokio::test]
    async fn test_not_connected_until_namespace_joined() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(r#"0{"sid":"abc"}"#.to_string()))
                .await
                .unwrap();
            assert_eq!(next_text(&mut ws).await, "40");
            ws.send(Message::Text(r#"44{"message":"Not authorized"}"#.to_string()))
                .await
                .unwrap();
            // Hold the socket open until the client hangs up
            while ws.next().await.is_some() {}
        });

        let mut channel = WebSocketChannel::connect(&format!("ws://{}", addr));
        sleep(Duration::from_millis(100)).await;
        assert_eq!(
            channel.poll(),
            Some(ChannelEvent::ConnectError("Not authorized".to_string()))
        );
        assert!(channel.poll().is_none());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_websocket_connect_error() {
        let mut channel = WebSocketChannel::connect("not a url");
        sleep(Duration::from_millis(100)).await;
        assert!(matches!(channel.poll(), Some(ChannelEvent::ConnectError(_))));
        assert!(channel.poll().is_none());
    }
}

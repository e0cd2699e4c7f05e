//! Stream-based live channel.
//!
//! Carries newline-delimited frames over any async byte stream. Used for the
//! `--connect host:port` TCP mode and for in-memory duplex streams in tests.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::wire::{decode_frame, encode_request_update};
use super::{ChannelEvent, LiveChannel, Outbound};
use crate::error::ChannelError;

/// A live channel over a newline-delimited byte stream.
///
/// A background task reads frames from the stream and forwards decoded
/// events; outbound requests are written back as one frame per line.
///
/// # Example
///
/// ```
/// use sanctuary_watch::source::StreamChannel;
///
/// # tokio_test::block_on(async {
/// let (client, _server) = tokio::io::duplex(1024);
/// let channel = StreamChannel::spawn(client, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamChannel {
    events: mpsc::Receiver<ChannelEvent>,
    outbound: mpsc::Sender<Outbound>,
    description: String,
}

impl StreamChannel {
    /// Wrap an already established stream. Reports `Connected` immediately.
    pub fn spawn<S>(stream: S, description: &str) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::channel(16);
        let (outbound_tx, outbound_rx) = mpsc::channel(8);

        tokio::spawn(async move {
            if events_tx.send(ChannelEvent::Connected).await.is_err() {
                return;
            }
            run(stream, events_tx, outbound_rx).await;
        });

        Self {
            events: events_rx,
            outbound: outbound_tx,
            description: format!("stream: {}", description),
        }
    }

    /// Open a TCP connection in the background.
    ///
    /// A failed connect is reported as a single `ConnectError`; no retry is
    /// attempted.
    pub fn connect_tcp(addr: &str) -> Self {
        let (events_tx, events_rx) = mpsc::channel(16);
        let (outbound_tx, outbound_rx) = mpsc::channel(8);
        let target = addr.to_string();

        tokio::spawn(async move {
            match TcpStream::connect(&target).await {
                Ok(stream) => {
                    info!("Connected to {}", target);
                    if events_tx.send(ChannelEvent::Connected).await.is_err() {
                        return;
                    }
                    run(stream, events_tx, outbound_rx).await;
                }
                Err(e) => {
                    warn!("Failed to connect to {}: {}", target, e);
                    let _ = events_tx.send(ChannelEvent::ConnectError(e.to_string())).await;
                }
            }
        });

        Self {
            events: events_rx,
            outbound: outbound_tx,
            description: format!("tcp: {}", addr),
        }
    }
}

async fn run<S>(
    stream: S,
    events: mpsc::Sender<ChannelEvent>,
    mut outbound: mpsc::Receiver<Outbound>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match decode_frame(&line) {
                    Ok(Some(event)) => {
                        if events.send(event).await.is_err() {
                            // Dashboard dropped
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => debug!("Ignoring frame: {}", e),
                },
                Ok(None) => {
                    let _ = events.send(ChannelEvent::Disconnected).await;
                    return;
                }
                Err(e) => {
                    warn!("Stream read error: {}", e);
                    let _ = events.send(ChannelEvent::Disconnected).await;
                    return;
                }
            },
            request = outbound.recv() => match request {
                Some(Outbound::RequestUpdate) => {
                    let frame = format!("{}\n", encode_request_update());
                    if let Err(e) = writer.write_all(frame.as_bytes()).await {
                        warn!("Stream write error: {}", e);
                        let _ = events.send(ChannelEvent::Disconnected).await;
                        return;
                    }
                }
                None => return,
            },
        }
    }
}

impl LiveChannel for StreamChannel {
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
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_stream_channel_reports_connected_and_updates() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut channel = StreamChannel::spawn(client, "test");

        server
            .write_all(b"{\"event\":\"cluster_update\",\"data\":{\"agents\":{}}}\n")
            .await
            .unwrap();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(channel.poll(), Some(ChannelEvent::Connected));
        assert_eq!(
            channel.poll(),
            Some(ChannelEvent::ClusterUpdate(json!({ "agents": {} })))
        );
        assert!(channel.poll().is_none());
    }

    #[tokio::test]
    async fn test_stream_channel_writes_requests() {
        let (client, server) = tokio::io::duplex(4096);
        let mut channel = StreamChannel::spawn(client, "test");

        channel.request_update().unwrap();

        let mut lines = BufReader::new(server).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(line, encode_request_update());
    }

    #[tokio::test]
    async fn test_stream_channel_skips_bad_frames() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut channel = StreamChannel::spawn(client, "test");

        server.write_all(b"garbage\n2\n42[\"cluster_update\",{}]\n").await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(channel.poll(), Some(ChannelEvent::Connected));
        assert_eq!(channel.poll(), Some(ChannelEvent::ClusterUpdate(json!({}))));
        assert!(channel.poll().is_none());
    }

    #[tokio::test]
    async fn test_stream_channel_reports_disconnect_on_eof() {
        let (client, server) = tokio::io::duplex(4096);
        let mut channel = StreamChannel::spawn(client, "test");
        drop(server);
        sleep(Duration::from_millis(50)).await;

        assert_eq!(channel.poll(), Some(ChannelEvent::Connected));
        assert_eq!(channel.poll(), Some(ChannelEvent::Disconnected));
    }

    #[tokio::test]
    async fn test_connect_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let mut channel = StreamChannel::connect_tcp(&addr);
        assert_eq!(channel.description(), format!("tcp: {}", addr));

        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(b"[\"cluster_update\",{\"models\":{}}]\n").await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(channel.poll(), Some(ChannelEvent::Connected));
        assert_eq!(
            channel.poll(),
            Some(ChannelEvent::ClusterUpdate(json!({ "models": {} })))
        );
    }
}

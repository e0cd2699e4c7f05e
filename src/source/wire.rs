//! Frame codec for the live channel.
//!
//! Inbound frames are accepted in two shapes:
//!
//! ```text
//! {"event": "cluster_update", "data": {...}}     envelope
//! 42["cluster_update", {...}]                    Socket.IO event packet
//! ```
//!
//! Leading Engine.IO packet digits are stripped. Frames that carry only
//! digits (pings, pongs, acks) decode to `None`, as do unknown event names.
//!
//! The WebSocket transport speaks Engine.IO v4 / Socket.IO v5 and goes
//! through [`decode_packet`] instead, which also surfaces the control
//! packets the client has to answer:
//!
//! ```text
//! server                      client
//! 0{"sid":...}         ──▶
//!                      ◀──    40
//! 40{"sid":...}        ──▶    (joined: Connected)
//! 2                    ──▶
//!                      ◀──    3
//!                      ◀──    42["request_update"]
//! 42["cluster_update",{...}] ──▶
//! ```

use serde_json::Value;

use super::ChannelEvent;
use crate::error::WireError;

/// Name of the outbound snapshot request.
pub const REQUEST_UPDATE: &str = "request_update";

/// Socket.IO connect packet for the default namespace.
pub const JOIN_NAMESPACE: &str = "40";

/// Engine.IO pong, the answer to a ping.
pub const PONG: &str = "3";

/// Encode the outbound `request_update` event (no payload).
pub fn encode_request_update() -> String {
    serde_json::json!({ "event": REQUEST_UPDATE }).to_string()
}

/// Encode `request_update` as a Socket.IO event packet.
pub fn encode_socketio_request_update() -> String {
    format!("42{}", serde_json::json!([REQUEST_UPDATE]))
}

/// One Engine.IO/Socket.IO packet received over the WebSocket transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine.IO open (`0{...}`); answer with [`JOIN_NAMESPACE`].
    Open,
    /// Engine.IO ping (`2`); answer with [`PONG`].
    Ping,
    /// Engine.IO close (`1`).
    Close,
    /// The namespace accepted us (`40{...}`).
    Joined,
    /// The server left the namespace (`41`).
    Left,
    /// The namespace refused us (`44{...}`).
    Refused(String),
    /// An event packet (`42[...]`) carrying an event of interest.
    Event(ChannelEvent),
    /// Anything else: noops, acks, unknown events.
    Ignored,
}

/// Decode one WebSocket text frame as an Engine.IO packet.
pub fn decode_packet(frame: &str) -> Result<Packet, WireError> {
    let frame = frame.trim();
    let mut chars = frame.chars();
    match chars.next() {
        Some('0') => Ok(Packet::Open),
        Some('1') => Ok(Packet::Close),
        Some('2') => Ok(Packet::Ping),
        Some('4') => decode_message(chars.as_str()),
        _ => Ok(Packet::Ignored),
    }
}

/// Socket.IO packet inside an Engine.IO message.
fn decode_message(body: &str) -> Result<Packet, WireError> {
    let mut chars = body.chars();
    match chars.next() {
        Some('0') => Ok(Packet::Joined),
        Some('1') => Ok(Packet::Left),
        Some('2') => Ok(decode_frame(chars.as_str())?.map_or(Packet::Ignored, Packet::Event)),
        Some('4') => {
            let payload = serde_json::from_str(chars.as_str()).unwrap_or(Value::Null);
            Ok(Packet::Refused(error_text(&payload)))
        }
        _ => Ok(Packet::Ignored),
    }
}

/// Decode one text frame into a channel event.
///
/// Returns `Ok(None)` for frames that carry no event of interest.
pub fn decode_frame(frame: &str) -> Result<Option<ChannelEvent>, WireError> {
    let body = frame.trim().trim_start_matches(|c: char| c.is_ascii_digit());
    if body.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(body)?;
    let (name, payload) = match value {
        Value::Object(mut map) => {
            let name = match map.remove("event") {
                Some(Value::String(name)) => name,
                _ => return Err(WireError::Shape),
            };
            (name, map.remove("data").unwrap_or(Value::Null))
        }
        Value::Array(items) => {
            let mut items = items.into_iter();
            let name = match items.next() {
                Some(Value::String(name)) => name,
                _ => return Err(WireError::Shape),
            };
            (name, items.next().unwrap_or(Value::Null))
        }
        _ => return Err(WireError::Shape),
    };

    Ok(event_from_parts(&name, payload))
}

fn event_from_parts(name: &str, payload: Value) -> Option<ChannelEvent> {
    match name {
        "cluster_update" => Some(ChannelEvent::ClusterUpdate(payload)),
        "connect" => Some(ChannelEvent::Connected),
        "disconnect" => Some(ChannelEvent::Disconnected),
        "connect_error" => Some(ChannelEvent::ConnectError(error_text(&payload))),
        _ => None,
    }
}

fn error_text(payload: &Value) -> String {
    match payload {
        Value::Null => "connection error".to_string(),
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => payload.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_envelope() {
        let event = decode_frame(r#"{"event":"cluster_update","data":{"agents":{}}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event, ChannelEvent::ClusterUpdate(json!({ "agents": {} })));
    }

    #[test]
    fn test_decode_socketio_packet() {
        let event = decode_frame(r#"42["cluster_update",{"models":{}}]"#).unwrap().unwrap();
        assert_eq!(event, ChannelEvent::ClusterUpdate(json!({ "models": {} })));

        let event = decode_frame(r#"["connect_error",{"message":"refused"}]"#)
            .unwrap()
            .unwrap();
        assert_eq!(event, ChannelEvent::ConnectError("refused".to_string()));
    }

    #[test]
    fn test_decode_ignores_pings_and_unknown_events() {
        assert!(decode_frame("2").unwrap().is_none());
        assert!(decode_frame("  ").unwrap().is_none());
        assert!(decode_frame(r#"{"event":"heartbeat"}"#).unwrap().is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_frame("not json"), Err(WireError::Json(_))));
        assert!(matches!(decode_frame("{\"data\":1}"), Err(WireError::Shape)));
        assert!(matches!(decode_frame("[1, 2]"), Err(WireError::Shape)));
    }

    #[test]
    fn test_cluster_update_without_payload() {
        let event = decode_frame(r#"{"event":"cluster_update"}"#).unwrap().unwrap();
        assert_eq!(event, ChannelEvent::ClusterUpdate(Value::Null));
    }

    #[test]
    fn test_encode_request_update() {
        let frame = encode_request_update();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({ "event": "request_update" }));

        assert_eq!(encode_socketio_request_update(), r#"42["request_update"]"#);
    }

    #[test]
    fn test_decode_engineio_control_packets() {
        let open = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;
        assert_eq!(decode_packet(open).unwrap(), Packet::Open);
        assert_eq!(decode_packet("2").unwrap(), Packet::Ping);
        assert_eq!(decode_packet("1").unwrap(), Packet::Close);
        assert_eq!(decode_packet("6").unwrap(), Packet::Ignored);
        assert_eq!(decode_packet(r#"40{"sid":"xyz"}"#).unwrap(), Packet::Joined);
        assert_eq!(decode_packet("41").unwrap(), Packet::Left);
        assert_eq!(
            decode_packet(r#"44{"message":"Not authorized"}"#).unwrap(),
            Packet::Refused("Not authorized".to_string())
        );
    }

    #[test]
    fn test_decode_socketio_event_packets() {
        assert_eq!(
            decode_packet(r#"42["cluster_update",{"agents":{}}]"#).unwrap(),
            Packet::Event(ChannelEvent::ClusterUpdate(json!({ "agents": {} })))
        );
        assert_eq!(decode_packet(r#"42["heartbeat"]"#).unwrap(), Packet::Ignored);
        assert!(decode_packet("42[oops").is_err());
    }
}

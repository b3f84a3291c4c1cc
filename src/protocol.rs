//! Wire messages exchanged with clients, and their JSON encoding.
//!
//! Both directions are closed enums tagged by a `type` field. Anything that
//! does not decode into one of the known variants is a protocol error.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{ActionError, JoinError};
use crate::config::BOARD_SIZE;
use crate::projection::RoomView;
use crate::room::PlayerId;

/// Fleet submission body of `PLACE_FLEET`.
///
/// `board` is kept as raw JSON so that a malformed grid is reported as a bad
/// fleet instead of being dropped as an unreadable message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetPayload {
    #[serde(default)]
    pub board: Value,
}

/// Actions accepted from a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    CreateRoom,
    JoinRoom {
        #[serde(deserialize_with = "lenient_string")]
        code: String,
    },
    PlaceFleet {
        #[serde(default)]
        payload: Option<FleetPayload>,
        #[serde(default)]
        ready: bool,
    },
    Fire {
        #[serde(default, deserialize_with = "coerce_coord")]
        r: usize,
        #[serde(default, deserialize_with = "coerce_coord")]
        c: usize,
    },
    RequestState,
    /// Liveness acknowledgement; never reaches the room logic.
    Heartbeat,
}

/// Error kinds reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NoSuchRoom,
    RoomFull,
    BadFleet,
}

impl ErrorKind {
    /// The client-visible error for a refused join, if it has one.
    pub fn for_join(err: &JoinError) -> Option<Self> {
        match err {
            JoinError::NoSuchRoom => Some(ErrorKind::NoSuchRoom),
            JoinError::RoomFull => Some(ErrorKind::RoomFull),
            JoinError::AlreadySeated => None,
        }
    }

    /// The client-visible error for an action failure, if it has one.
    pub fn for_action(err: &ActionError) -> Option<Self> {
        match err {
            ActionError::BadFleet(_) => Some(ErrorKind::BadFleet),
            _ => None,
        }
    }
}

/// Signals pushed to a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    RoomCreated {
        code: String,
    },
    Joined {
        code: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    RoomState(RoomView),
    Error {
        error: ErrorKind,
    },
    /// Liveness probe; clients answer with their own `HEARTBEAT`.
    Heartbeat,
}

/// Serialize a message into a frame body.
pub fn encode<T: Serialize>(msg: &T) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))
}

/// Parse a frame body into a message.
pub fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(frame)
}

/// Read a submitted board as rows of integers.
///
/// Returns `None` when the value is not an array of arrays of JSON integers;
/// row and column counts are left to the sanitizer.
pub fn grid_from_json(value: &Value) -> Option<Vec<Vec<i64>>> {
    value
        .as_array()?
        .iter()
        .map(|row| -> Option<Vec<i64>> { row.as_array()?.iter().map(Value::as_i64).collect() })
        .collect()
}

/// Coerce a coordinate the way a lenient client would send it: numbers are
/// truncated, numeric strings parsed, anything else reads as 0. The result
/// is clamped onto the board.
fn coerce_coord<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    let raw = if raw.is_finite() { raw.trunc() } else { 0.0 };
    Ok(raw.clamp(0.0, (BOARD_SIZE - 1) as f64) as usize)
}

/// Accept a join code given either as a string or as a bare number.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a room code, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_tagged_actions() {
        let msg: ClientMessage = decode(br#"{"type":"CREATE_ROOM"}"#).unwrap();
        assert_eq!(msg, ClientMessage::CreateRoom);

        let msg: ClientMessage = decode(br#"{"type":"JOIN_ROOM","code":"042137"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                code: "042137".into()
            }
        );

        let msg: ClientMessage = decode(br#"{"type":"JOIN_ROOM","code":123456}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                code: "123456".into()
            }
        );
    }

    #[test]
    fn unknown_or_broken_messages_fail_to_decode() {
        assert!(decode::<ClientMessage>(br#"{"type":"SURRENDER"}"#).is_err());
        assert!(decode::<ClientMessage>(br#"{"code":"123456"}"#).is_err());
        assert!(decode::<ClientMessage>(b"not json").is_err());
        assert!(decode::<ClientMessage>(br#"{"type":"JOIN_ROOM"}"#).is_err());
    }

    #[test]
    fn fire_coordinates_are_coerced_and_clamped() {
        let cases = [
            (json!({"type":"FIRE","r":3,"c":4}), (3, 4)),
            (json!({"type":"FIRE","r":-2,"c":12}), (0, 9)),
            (json!({"type":"FIRE","r":"7","c":2.9}), (7, 2)),
            (json!({"type":"FIRE","r":null,"c":"x"}), (0, 0)),
            (json!({"type":"FIRE"}), (0, 0)),
        ];
        for (value, expected) in cases {
            let msg: ClientMessage = serde_json::from_value(value).unwrap();
            assert_eq!(
                msg,
                ClientMessage::Fire {
                    r: expected.0,
                    c: expected.1
                }
            );
        }
    }

    #[test]
    fn place_fleet_keeps_board_raw() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "PLACE_FLEET",
            "payload": {"board": [[1, 2], [3]]},
            "ready": true
        }))
        .unwrap();
        let ClientMessage::PlaceFleet { payload, ready } = msg else {
            panic!("expected PLACE_FLEET");
        };
        assert!(ready);
        let grid = grid_from_json(&payload.unwrap().board).unwrap();
        assert_eq!(grid, vec![vec![1, 2], vec![3]]);

        let msg: ClientMessage = serde_json::from_value(json!({"type":"PLACE_FLEET"})).unwrap();
        assert_eq!(
            msg,
            ClientMessage::PlaceFleet {
                payload: None,
                ready: false
            }
        );
    }

    #[test]
    fn non_integer_cells_are_not_a_grid() {
        assert!(grid_from_json(&json!([[0, 1.5]])).is_none());
        assert!(grid_from_json(&json!([[0, "1"]])).is_none());
        assert!(grid_from_json(&json!({"rows": 10})).is_none());
        assert!(grid_from_json(&json!([0, 1])).is_none());
    }

    #[test]
    fn server_messages_use_wire_names() {
        let frame = encode(&ServerMessage::Joined {
            code: "000111".into(),
            player_id: PlayerId::from("ab12cd34"),
        })
        .unwrap();
        let value: Value = serde_json::from_slice(&frame).unwrap();
        assert_eq!(
            value,
            json!({"type":"JOINED","code":"000111","playerId":"ab12cd34"})
        );

        let frame = encode(&ServerMessage::Error {
            error: ErrorKind::BadFleet,
        })
        .unwrap();
        let value: Value = serde_json::from_slice(&frame).unwrap();
        assert_eq!(value, json!({"type":"ERROR","error":"BAD_FLEET"}));
    }

    #[test]
    fn repeated_join_has_no_wire_error() {
        assert_eq!(ErrorKind::for_join(&JoinError::RoomFull), Some(ErrorKind::RoomFull));
        assert_eq!(ErrorKind::for_join(&JoinError::NoSuchRoom), Some(ErrorKind::NoSuchRoom));
        assert_eq!(ErrorKind::for_join(&JoinError::AlreadySeated), None);
    }
}

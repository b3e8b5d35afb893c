//! Candid message envelope exchanged with observers.

use candid::{CandidType, Deserialize};

// =============================================================================
// ENVELOPE
// =============================================================================

#[derive(CandidType, Deserialize, Clone, Debug, PartialEq)]
pub enum Message {
    Register(Player),
    ServerData(ServerData),
    WorldData(WorldData),
    WorldSnapshot(WorldSnapshot),
    Command(Command),
    Response(Response),
    RleOptions(RleOptions),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Register(_) => "register",
            Message::ServerData(_) => "server_data",
            Message::WorldData(_) => "world_data",
            Message::WorldSnapshot(_) => "world_snapshot",
            Message::Command(_) => "command",
            Message::Response(_) => "response",
            Message::RleOptions(_) => "rle_options",
        }
    }
}

pub fn encode(message: &Message) -> Result<Vec<u8>, candid::Error> {
    candid::encode_one(message)
}

pub fn decode(bytes: &[u8]) -> Result<Message, candid::Error> {
    candid::decode_one(bytes)
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Registered identity; `color` is packed like a cell (bits 8-31 RGB).
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub color: u32,
}

#[derive(CandidType, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerData {
    pub players: Vec<Player>,
}

/// One generation, run-length encoded (see `codec::encode_delta`).
/// Dimensions come from the observer's snapshot.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WorldData {
    pub data: Vec<u32>,
    pub tick: u64,
    pub paused: bool,
}

/// Full uncompressed grid, sent once per observer before any `WorldData`.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub data: Vec<u32>,
    pub tick: u64,
    pub width: u32,
    pub height: u32,
}

/// What an observer may ask for. Colour is attached server-side from `Player`.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    MarkCell { x: u32, y: u32 },
    PlaceRle { name: String, x: u32, y: u32 },
    TogglePause,
    ClearBoard,
}

#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Success,
    Failure(String),
}

#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RleOption {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(CandidType, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RleOptions {
    pub rles: Vec<RleOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let messages = vec![
            Message::Register(Player { name: "ada".into(), color: 0xFF00_0000 }),
            Message::Command(Command::PlaceRle { name: "glider".into(), x: 4, y: 9 }),
            Message::WorldData(WorldData { data: vec![6, 0xFF, 2], tick: 42, paused: true }),
        ];
        for message in messages {
            let bytes = encode(&message).unwrap();
            assert_eq!(decode(&bytes).unwrap(), message);
        }
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode(b"not candid").is_err());
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn test_decode_wrong_type_fails() {
        let bytes = candid::encode_one(&7u64).unwrap();
        assert!(decode(&bytes).is_err());
    }
}

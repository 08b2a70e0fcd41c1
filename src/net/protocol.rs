//! Wire protocol message definitions
//! Newline-delimited JSON objects in both directions

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::game::player::{InputSnapshot, PlayerId};

/// Line terminator for every frame
pub const FRAME_DELIMITER: char = '\n';

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Latest key state and aim
    Input(InputMsg),

    /// Any other `type`; ignored
    #[serde(other)]
    Unknown,
}

/// Body of an `input` message. Absent or malformed fields fall back to
/// their defaults instead of rejecting the message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InputMsg {
    #[serde(default, deserialize_with = "truthy")]
    pub up: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub down: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub left: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub right: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub shoot: bool,
    /// Aim angle in degrees
    #[serde(default, deserialize_with = "lenient_number")]
    pub angle: Option<f32>,
    /// Older clients send the aim angle under this name
    #[serde(default, deserialize_with = "lenient_number")]
    pub aim_x: Option<f32>,
    /// Client-reported position; decoded but not trusted
    #[serde(default, deserialize_with = "lenient_number")]
    pub x: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub y: Option<f32>,
}

impl InputMsg {
    pub fn keys(&self) -> InputSnapshot {
        InputSnapshot {
            up: self.up,
            down: self.down,
            left: self.left,
            right: self.right,
            shoot: self.shoot,
        }
    }

    /// `angle` wins over `aim_x` when both are present
    pub fn aim_angle(&self) -> Option<f32> {
        self.angle.or(self.aim_x)
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.map(|f| f as f32).filter(|f| f.is_finite()))
}

/// Decode one inbound line. Lines that are not JSON objects, or carry no
/// `type`, yield `None`.
pub fn decode_line(line: &str) -> Option<ClientMsg> {
    let value: Value = serde_json::from_str(line).ok()?;
    if !value.is_object() {
        return None;
    }
    ClientMsg::deserialize(value).ok()
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg<'a> {
    /// Full world snapshot, personalised with the recipient's id
    State {
        your_id: PlayerId,
        #[serde(flatten)]
        world: &'a WorldSnapshot,
    },
}

/// Encode a message as one newline-terminated frame
pub fn encode_line(msg: &ServerMsg<'_>) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(msg)?;
    line.push(FRAME_DELIMITER);
    Ok(line)
}

/// Roster and score state shared by every recipient of one broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Server time in seconds
    pub t: f64,
    pub map: MapInfo,
    pub players: Vec<PlayerSnapshot>,
    pub scores: TeamScores,
    pub game_won: bool,
    pub winner_team: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    pub width: f32,
    pub height: f32,
}

/// Kill totals keyed by team index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScores {
    #[serde(rename = "0")]
    pub green: u32,
    #[serde(rename = "1")]
    pub orange: u32,
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    /// Team index (0 or 1)
    pub team: u8,
    pub x: f32,
    pub y: f32,
    /// Facing angle in degrees
    pub angle: f32,
    pub alive: bool,
    /// Health (0-100)
    pub health: i32,
    pub kills: u32,
    pub is_shooting: bool,
    pub keys: KeyState,
    /// Victims hit since the previous snapshot
    pub hits: Vec<PlayerId>,
}

/// Directional keys as the client names them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    pub w: bool,
    pub a: bool,
    pub s: bool,
    pub d: bool,
}

impl From<InputSnapshot> for KeyState {
    fn from(input: InputSnapshot) -> Self {
        Self {
            w: input.up,
            a: input.left,
            s: input.down,
            d: input.right,
        }
    }
}

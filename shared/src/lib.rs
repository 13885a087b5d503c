use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod codec;

pub use codec::{decode_packet, encode_packet, read_packet, write_packet, ProtocolError};

pub const ARENA_WIDTH: f32 = 1080.0;
pub const ARENA_HEIGHT: f32 = 720.0;
pub const MIN_PLAYER_SIZE: f32 = 20.0;
pub const FOOD_SIZE: f32 = 5.0;
pub const FOOD_COUNT: usize = 75;
pub const FOOD_SPAWN_MARGIN: f32 = 10.0;
pub const GAME_DURATION_SECS: u64 = 300;
pub const PHYSICS_DT: f32 = 1.0 / 60.0;
pub const SPEED_FACTOR: f32 = 1000.0 * 1.1;
pub const SENSITIVITY: f32 = 1.5;
pub const BORDER_MARGIN: f32 = 50.0;
pub const BORDER_SPEED_BOOST: f32 = 1.5;
pub const DECAY_FACTOR: f32 = 0.98;
pub const DECAY_INTERVAL_MS: u64 = 1000;
pub const SNAPSHOT_INTERVAL_MS: u64 = 10;
pub const DEFAULT_PORT: u16 = 1401;

pub type PlayerId = u64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Hello { name: String },
    Identity { player_id: PlayerId },
    Input { target_x: f32, target_y: f32 },
    StateUpdate(Snapshot),
}

impl Packet {
    /// Short label used in log lines and unexpected-packet errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Hello { .. } => "hello",
            Packet::Identity { .. } => "identity-assigned",
            Packet::Input { .. } => "input",
            Packet::StateUpdate(_) => "state-update",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct FoodView {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

/// A single consistent read of the arena, as sent to every client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub players: HashMap<PlayerId, PlayerView>,
    pub food: Vec<FoodView>,
    pub time_left: u64,
}

impl Snapshot {
    /// Top `n` players by score, highest first. Equal scores rank the lower id first.
    pub fn leaderboard(&self, n: usize) -> Vec<(PlayerId, &PlayerView)> {
        let mut ranked: Vec<(PlayerId, &PlayerView)> =
            self.players.iter().map(|(id, view)| (*id, view)).collect();
        ranked.sort_by(|(id_a, a), (id_b, b)| b.score.cmp(&a.score).then(id_a.cmp(id_b)));
        ranked.truncate(n);
        ranked
    }

    pub fn winner(&self) -> Option<(PlayerId, &PlayerView)> {
        self.leaderboard(1).into_iter().next()
    }

    pub fn is_over(&self) -> bool {
        self.time_left == 0
    }
}

//! Server and arena settings.

use shared::{
    ARENA_HEIGHT, ARENA_WIDTH, DEFAULT_PORT, FOOD_COUNT, GAME_DURATION_SECS, SNAPSHOT_INTERVAL_MS,
};
use std::time::Duration;

/// Parameters of a single arena.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: f32,
    pub height: f32,
    /// Length of a match, counted from the first player joining.
    pub duration: Duration,
    /// Number of food pellets kept on the field.
    pub food_count: usize,
    /// Fixed seed for reproducible spawns; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            duration: Duration::from_secs(GAME_DURATION_SECS),
            food_count: FOOD_COUNT,
            seed: None,
        }
    }
}

/// Listener and per-connection timing.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Bounded wait on `accept` so the listener can observe shutdown.
    pub accept_timeout: Duration,
    /// Deadline for the name announcement and the identity reply.
    pub handshake_timeout: Duration,
    /// Pacing of each connection handler's loop.
    pub tick_interval: Duration,
    /// Minimum gap between two snapshots on the same connection.
    pub snapshot_interval: Duration,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            accept_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(5),
            tick_interval: Duration::from_millis(5),
            snapshot_interval: Duration::from_millis(SNAPSHOT_INTERVAL_MS),
            game: GameConfig::default(),
        }
    }
}

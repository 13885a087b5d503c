//! Autonomous steering that turns the latest snapshot into input targets

use shared::{PlayerId, PlayerView, Snapshot, ARENA_HEIGHT, ARENA_WIDTH, MIN_PLAYER_SIZE};

/// Extra distance beyond a larger blob's size at which we start fleeing
const THREAT_MARGIN: f32 = 80.0;
/// A pellet is left alone when a larger blob is this close to it
const GUARD_RADIUS: f32 = 60.0;
/// How far ahead of us the flee target is placed
const FLEE_DISTANCE: f32 = 150.0;

/// Picks where our blob should head next, in arena coordinates
///
/// The server consumes targets in arena space, so targets produced here are
/// sent unchanged.
pub struct InputManager {
    player_id: PlayerId,
    inputs_sent: u64,
    last_target: Option<(f32, f32)>,
}

impl InputManager {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            inputs_sent: 0,
            last_target: None,
        }
    }

    /// Chooses the next target, or `None` while we are absent from the snapshot
    pub fn next_target(&mut self, snapshot: &Snapshot) -> Option<(f32, f32)> {
        let me = snapshot.players.get(&self.player_id)?;

        let target = self
            .flee_target(me, snapshot)
            .or_else(|| self.food_target(me, snapshot))
            .unwrap_or((ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0));

        self.inputs_sent += 1;
        self.last_target = Some(target);
        Some(target)
    }

    pub fn inputs_sent(&self) -> u64 {
        self.inputs_sent
    }

    pub fn last_target(&self) -> Option<(f32, f32)> {
        self.last_target
    }

    fn larger_opponents<'a>(
        &'a self,
        me: &'a PlayerView,
        snapshot: &'a Snapshot,
    ) -> impl Iterator<Item = &'a PlayerView> + 'a {
        snapshot
            .players
            .iter()
            .filter(move |(id, other)| **id != self.player_id && other.size > me.size)
            .map(|(_, other)| other)
    }

    fn flee_target(&self, me: &PlayerView, snapshot: &Snapshot) -> Option<(f32, f32)> {
        let threat = self
            .larger_opponents(me, snapshot)
            .map(|other| (distance(me.x, me.y, other.x, other.y), other))
            .filter(|(dist, other)| *dist < other.size + THREAT_MARGIN)
            .min_by(|a, b| a.0.total_cmp(&b.0))?
            .1;

        let (dx, dy) = (me.x - threat.x, me.y - threat.y);
        let len = (dx * dx + dy * dy).sqrt();
        // Sitting exactly on the threat: any direction will do
        let (nx, ny) = if len > 0.0 { (dx / len, dy / len) } else { (1.0, 0.0) };

        let half = MIN_PLAYER_SIZE / 2.0;
        Some((
            (me.x + nx * FLEE_DISTANCE).clamp(half, ARENA_WIDTH - half),
            (me.y + ny * FLEE_DISTANCE).clamp(half, ARENA_HEIGHT - half),
        ))
    }

    fn food_target(&self, me: &PlayerView, snapshot: &Snapshot) -> Option<(f32, f32)> {
        snapshot
            .food
            .iter()
            .filter(|food| {
                !self
                    .larger_opponents(me, snapshot)
                    .any(|other| distance(food.x, food.y, other.x, other.y) < other.size + GUARD_RADIUS)
            })
            .map(|food| (distance(me.x, me.y, food.x, food.y), food))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, food)| (food.x, food.y))
    }
}

fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

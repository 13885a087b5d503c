//! Authoritative arena state: players, food, the match clock and the
//! collision/decay pass that every connection handler drives.

use crate::config::GameConfig;
use crate::entity::{Food, Player};
use crate::physics::Vector2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{PlayerId, Snapshot, DECAY_FACTOR, DECAY_INTERVAL_MS, MIN_PLAYER_SIZE};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, RwLockReadGuard};

const DECAY_INTERVAL: Duration = Duration::from_millis(DECAY_INTERVAL_MS);

#[derive(Debug)]
pub struct World {
    config: GameConfig,
    players: HashMap<PlayerId, Player>,
    food: Vec<Food>,
    /// Set when the first player joins; never reset.
    start_time: Option<Instant>,
    last_decay: Instant,
    rng: StdRng,
}

impl World {
    pub fn new(config: GameConfig) -> Self {
        Self::new_at(config, Instant::now())
    }

    pub fn new_at(config: GameConfig, now: Instant) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let food = (0..config.food_count)
            .map(|_| Food::spawn(&mut rng, config.width, config.height))
            .collect();

        Self {
            config,
            players: HashMap::new(),
            food,
            start_time: None,
            last_decay: now,
            rng,
        }
    }

    pub fn add_player(&mut self, id: PlayerId, name: String) {
        self.add_player_at(id, name, Instant::now());
    }

    pub fn add_player_at(&mut self, id: PlayerId, name: String, now: Instant) {
        if self.start_time.is_none() {
            self.start_time = Some(now);
            info!("First player joined, starting game timer");
        }

        let position = Player::random_position(&mut self.rng, self.config.width, self.config.height);
        info!(
            "Added player {} ({}) at ({:.1}, {:.1})",
            id, name, position.x, position.y
        );
        self.players.insert(id, Player::new(id, name, position));
    }

    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        if self.players.remove(&id).is_some() {
            info!("Removed player {}", id);
            true
        } else {
            false
        }
    }

    /// Applies one movement step for `id`. Unknown ids and non-finite
    /// targets are ignored.
    pub fn move_player(&mut self, id: PlayerId, target_x: f32, target_y: f32) -> bool {
        let target = Vector2::new(target_x, target_y);
        if !target.is_finite() {
            debug!("Ignoring non-finite target for player {}", id);
            return false;
        }

        let (width, height) = (self.config.width, self.config.height);
        match self.players.get_mut(&id) {
            Some(player) => {
                player.move_towards(target, width, height);
                true
            }
            None => false,
        }
    }

    /// One physics pass: player and food consumption, then the decay gate.
    pub fn step(&mut self) {
        self.step_at(Instant::now());
    }

    pub fn step_at(&mut self, now: Instant) {
        self.resolve_collisions();
        self.apply_decay(now);
    }

    fn resolve_collisions(&mut self) {
        let (width, height) = (self.config.width, self.config.height);
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();

        for &eater_id in &ids {
            for &prey_id in &ids {
                if eater_id == prey_id {
                    continue;
                }

                let (Some(eater), Some(prey)) =
                    (self.players.get(&eater_id), self.players.get(&prey_id))
                else {
                    continue;
                };

                // Equal sizes never eat each other
                if eater.size <= prey.size
                    || eater.position.distance(&prey.position) >= eater.size
                {
                    continue;
                }

                let (prey_size, prey_score) = (prey.size, prey.score);
                info!(
                    "Player {} (size {:.1}) ate {} (size {:.1})",
                    eater_id, eater.size, prey_id, prey_size
                );

                if let Some(prey) = self.players.get_mut(&prey_id) {
                    prey.respawn(&mut self.rng, width, height);
                }
                if let Some(eater) = self.players.get_mut(&eater_id) {
                    eater.size += prey_size * 0.5;
                    eater.score = eater.score.saturating_add(prey_score / 2);
                    eater.clamp_to_arena(width, height);
                    debug!("Player {} score: {}", eater_id, eater.score);
                }
            }

            let Some(player) = self.players.get_mut(&eater_id) else {
                continue;
            };

            let mut grew = false;
            for food in self.food.iter_mut() {
                if player.position.distance(&food.position) < player.size + food.size {
                    player.size += food.size;
                    player.score = player.score.saturating_add(food.size as u32);
                    debug!(
                        "Player {} ate food at ({:.0}, {:.0})",
                        eater_id, food.position.x, food.position.y
                    );
                    *food = Food::spawn(&mut self.rng, width, height);
                    grew = true;
                }
            }

            if grew {
                player.clamp_to_arena(width, height);
            }
        }
    }

    fn apply_decay(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_decay) < DECAY_INTERVAL {
            return;
        }

        for player in self.players.values_mut() {
            if player.size > MIN_PLAYER_SIZE {
                player.size = (player.size * DECAY_FACTOR).max(MIN_PLAYER_SIZE);
                debug!("Player {} decayed to {:.1}", player.id, player.size);
            }
        }
        self.last_decay = now;
    }

    /// Remaining match time; the full duration until someone has joined.
    pub fn time_left_at(&self, now: Instant) -> Duration {
        match self.start_time {
            Some(start) => self
                .config
                .duration
                .saturating_sub(now.saturating_duration_since(start)),
            None => self.config.duration,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> Snapshot {
        Snapshot {
            players: self
                .players
                .iter()
                .map(|(id, player)| (*id, player.view()))
                .collect(),
            food: self.food.iter().map(Food::view).collect(),
            time_left: self.time_left_at(now).as_secs(),
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn food(&self) -> &[Food] {
        &self.food
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

/// Handle to the one world shared by every connection handler.
///
/// A single lock guards the whole world and each method holds it for
/// exactly one logical operation, so a snapshot never observes half of a
/// collision pass and a removed player is never touched again.
#[derive(Debug, Clone)]
pub struct SharedWorld {
    inner: Arc<RwLock<World>>,
}

impl SharedWorld {
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    pub async fn add_player(&self, id: PlayerId, name: String) {
        self.inner.write().await.add_player(id, name);
    }

    pub async fn remove_player(&self, id: PlayerId) -> bool {
        self.inner.write().await.remove_player(id)
    }

    pub async fn move_player(&self, id: PlayerId, target_x: f32, target_y: f32) -> bool {
        self.inner.write().await.move_player(id, target_x, target_y)
    }

    pub async fn step(&self) {
        self.inner.write().await.step();
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.read().await.snapshot()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, World> {
        self.inner.read().await
    }
}

use crate::physics::{clamp_axis, Vector2};
use log::debug;
use rand::Rng;
use shared::{
    FoodView, PlayerId, PlayerView, BORDER_MARGIN, BORDER_SPEED_BOOST, FOOD_SIZE,
    FOOD_SPAWN_MARGIN, MIN_PLAYER_SIZE, PHYSICS_DT, SENSITIVITY, SPEED_FACTOR,
};

// Player blob
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Vector2,
    pub size: f32,
    pub score: u32,
    /// Unit heading of the last non-degenerate move.
    pub heading: Vector2,
}

impl Player {
    pub fn new(id: PlayerId, name: String, position: Vector2) -> Self {
        Player {
            id,
            name,
            position,
            size: MIN_PLAYER_SIZE,
            score: 0,
            heading: Vector2::default(),
        }
    }

    /// Picks a position where a minimum-size blob lies fully inside the arena.
    pub fn random_position<R: Rng>(rng: &mut R, width: f32, height: f32) -> Vector2 {
        let half = MIN_PLAYER_SIZE * 0.5;
        Vector2::new(
            random_coord(rng, half, width - half),
            random_coord(rng, half, height - half),
        )
    }

    // Speed shrinks with size; blobs near an edge get a boost
    pub fn speed(&self, width: f32, height: f32) -> f32 {
        let base = (SPEED_FACTOR / self.size) * SENSITIVITY;

        let near_x = self.position.x < BORDER_MARGIN || self.position.x > width - BORDER_MARGIN;
        let near_y = self.position.y < BORDER_MARGIN || self.position.y > height - BORDER_MARGIN;

        if near_x || near_y {
            base * BORDER_SPEED_BOOST
        } else {
            base
        }
    }

    /// Advances one physics step toward `target`.
    ///
    /// When the target coincides with the current position the blob keeps
    /// drifting along its remembered heading instead of stopping.
    pub fn move_towards(&mut self, target: Vector2, width: f32, height: f32) {
        if let Some(direction) = target.sub(&self.position).normalize() {
            self.heading = direction;
        }

        if !self.heading.is_zero() {
            let speed = self.speed(width, height);
            self.position = self.position.add(&self.heading.scale(speed * PHYSICS_DT));
        }

        self.clamp_to_arena(width, height);
        debug!(
            "Player {} moved to ({:.1}, {:.1})",
            self.id, self.position.x, self.position.y
        );
    }

    pub fn clamp_to_arena(&mut self, width: f32, height: f32) {
        self.position.x = clamp_axis(self.position.x, self.size, width);
        self.position.y = clamp_axis(self.position.y, self.size, height);
    }

    /// Returns the blob to its just-spawned state at a new random spot.
    pub fn respawn<R: Rng>(&mut self, rng: &mut R, width: f32, height: f32) {
        self.size = MIN_PLAYER_SIZE;
        self.score = 0;
        self.position = Self::random_position(rng, width, height);
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.position.x,
            y: self.position.y,
            size: self.size,
            name: self.name.clone(),
            score: self.score,
        }
    }
}

// Food pellet; never mutated after spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Food {
    pub position: Vector2,
    pub size: f32,
}

impl Food {
    pub fn spawn<R: Rng>(rng: &mut R, width: f32, height: f32) -> Self {
        Food {
            position: Vector2::new(
                random_coord(rng, 0.0, width - FOOD_SPAWN_MARGIN),
                random_coord(rng, 0.0, height - FOOD_SPAWN_MARGIN),
            ),
            size: FOOD_SIZE,
        }
    }

    pub fn view(&self) -> FoodView {
        FoodView {
            x: self.position.x,
            y: self.position.y,
            size: self.size,
        }
    }
}

fn random_coord<R: Rng>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high <= low {
        low
    } else {
        rng.gen_range(low..=high)
    }
}

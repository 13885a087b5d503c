///Represents a vector in 2D arena space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    ///Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f32,
    ///Value along the y-axis.
    /// Positive direction is down, matching client window coordinates.
    pub y: f32,
}

impl Vector2 {
    pub fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector, or `None` for the zero vector or any
    /// vector with a non-finite component.
    pub fn normalize(&self) -> Option<Vector2> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }

        // Pre-scale so huge components cannot overflow the magnitude
        let scale = self.x.abs().max(self.y.abs());
        if scale == 0.0 {
            return None;
        }
        let (x, y) = (self.x / scale, self.y / scale);
        let mag = (x * x + y * y).sqrt();
        Some(Vector2 {
            x: x / mag,
            y: y / mag,
        })
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns `self - other`.
    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    ///Euclidean distance between two points.
    pub fn distance(&self, other: &Vector2) -> f32 {
        self.sub(other).magnitude()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Clamps a coordinate so a body of the given size stays inside `[0, extent]`.
///
/// A body wider than the axis is centred on it.
pub fn clamp_axis(value: f32, size: f32, extent: f32) -> f32 {
    let half = size * 0.5;
    if half * 2.0 >= extent {
        extent * 0.5
    } else {
        value.clamp(half, extent - half)
    }
}

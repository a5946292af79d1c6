//! Shared types used across the crate.

use uuid::Uuid;

/// Stable player identifier.
pub type UserId = Uuid;

/// Connection handle the host passes in when a player connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerHandle {
    pub id: UserId,
    pub name: String,
}

impl PlayerHandle {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Position of a player inside a named world.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Whether both locations are in the same world.
    pub fn same_world(&self, other: &Location) -> bool {
        self.world == other.world
    }

    /// Squared euclidean distance, or `None` across worlds.
    pub fn distance_squared(&self, other: &Location) -> Option<f64> {
        if !self.same_world(other) {
            return None;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        Some(dx * dx + dy * dy + dz * dz)
    }

    /// Whether `other` is within `radius` blocks of this location.
    pub fn within(&self, other: &Location, radius: f64) -> bool {
        self.distance_squared(other)
            .is_some_and(|d| d <= radius * radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_world() {
        let a = Location::new("world", 0.0, 64.0, 0.0);
        let b = Location::new("world", 3.0, 64.0, 4.0);
        assert_eq!(a.distance_squared(&b), Some(25.0));
        assert!(a.within(&b, 5.0));
        assert!(!a.within(&b, 4.9));
    }

    #[test]
    fn test_distance_across_worlds() {
        let a = Location::new("world", 0.0, 64.0, 0.0);
        let b = Location::new("world_nether", 0.0, 64.0, 0.0);
        assert_eq!(a.distance_squared(&b), None);
        assert!(!a.within(&b, 1000.0));
    }
}

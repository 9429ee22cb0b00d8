//! Platforms: the two anchor rectangles the bridge spans between.

use serde::Serialize;

/// Width of each platform in world units.
pub const PLATFORM_WIDTH: f32 = 60.0;

/// Height of each platform in world units.
pub const PLATFORM_HEIGHT: f32 = 80.0;

/// Size of the world (canvas) the bridge lives in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned anchor rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Platform {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Distance from a point to the rectangle (zero inside or on the border).
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        let dx = (self.x - x).max(0.0).max(x - self.right());
        let dy = (self.y - y).max(0.0).max(y - self.bottom());
        (dx * dx + dy * dy).sqrt()
    }
}

/// Which of the two platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The left/right platform pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Platforms {
    pub left: Platform,
    pub right: Platform,
}

impl Platforms {
    /// Lay out both platforms around the centre of the world.
    ///
    /// `distance` is the gap between the platforms' facing edges; the right
    /// platform is shifted down by `height_diff`.
    pub fn around_center(bounds: WorldBounds, distance: f32, height_diff: f32) -> Self {
        let center_x = bounds.width / 2.0;
        let center_y = bounds.height / 2.0;

        let left = Platform::new(
            center_x - distance / 2.0 - PLATFORM_WIDTH,
            center_y - PLATFORM_HEIGHT / 2.0,
            PLATFORM_WIDTH,
            PLATFORM_HEIGHT,
        );
        let right = Platform::new(
            center_x + distance / 2.0,
            center_y - PLATFORM_HEIGHT / 2.0 + height_diff,
            PLATFORM_WIDTH,
            PLATFORM_HEIGHT,
        );

        Self { left, right }
    }

    pub fn get(&self, side: Side) -> &Platform {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// X coordinate of the edge that faces the gap.
    pub fn facing_edge_x(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.left.right(),
            Side::Right => self.right.x,
        }
    }

    /// Midpoint of a platform's gap-facing edge.
    pub fn facing_midpoint(&self, side: Side) -> (f32, f32) {
        (self.facing_edge_x(side), self.get(side).center_y())
    }

    /// Horizontal extent of the gap between the platforms.
    pub fn span(&self) -> (f32, f32) {
        (self.left.right(), self.right.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_around_center() {
        let platforms = Platforms::around_center(WorldBounds::new(1000.0, 600.0), 500.0, 40.0);

        assert_eq!(platforms.left.x, 190.0);
        assert_eq!(platforms.left.y, 260.0);
        assert_eq!(platforms.right.x, 750.0);
        assert_eq!(platforms.right.y, 300.0);
        assert_eq!(platforms.span(), (250.0, 750.0));
    }

    #[test]
    fn test_facing_midpoints() {
        let platforms = Platforms::around_center(WorldBounds::new(1000.0, 600.0), 500.0, 0.0);
        assert_eq!(platforms.facing_midpoint(Side::Left), (250.0, 300.0));
        assert_eq!(platforms.facing_midpoint(Side::Right), (750.0, 300.0));
    }

    #[test]
    fn test_distance_to_rect() {
        let platform = Platform::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(platform.distance_to(5.0, 5.0), 0.0);
        assert_eq!(platform.distance_to(10.0, 5.0), 0.0);
        assert_eq!(platform.distance_to(13.0, 14.0), 5.0);
        assert_eq!(platform.distance_to(-2.0, 5.0), 2.0);
    }
}

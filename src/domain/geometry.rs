// Axis-aligned boxes and the playfield rectangle.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap test; boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Smallest translation that moves `self` out of `other`, if they overlap.
    pub fn separation(&self, other: &Aabb) -> Option<(f32, f32)> {
        if !self.overlaps(other) {
            return None;
        }

        let push_left = (self.x + self.w) - other.x;
        let push_right = (other.x + other.w) - self.x;
        let push_up = (self.y + self.h) - other.y;
        let push_down = (other.y + other.h) - self.y;

        let min = push_left.min(push_right).min(push_up).min(push_down);
        let shift = if min == push_left {
            (-push_left, 0.0)
        } else if min == push_right {
            (push_right, 0.0)
        } else if min == push_up {
            (0.0, -push_up)
        } else {
            (0.0, push_down)
        };
        Some(shift)
    }
}

/// Bounded region in which entities are considered in-bounds. Origin is top-left.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Playfield {
    pub fn contains(&self, b: &Aabb) -> bool {
        b.x >= 0.0 && b.y >= 0.0 && b.x + b.w <= self.width && b.y + b.h <= self.height
    }

    /// Clamps a top-left corner so a square box of `size` stays inside.
    pub fn clamp(&self, x: f32, y: f32, size: f32) -> (f32, f32) {
        (
            x.clamp(0.0, (self.width - size).max(0.0)),
            y.clamp(0.0, (self.height - size).max(0.0)),
        )
    }
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

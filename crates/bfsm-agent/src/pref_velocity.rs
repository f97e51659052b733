//! The preferred-velocity output slot.
//!
//! A preferred velocity is more than a vector: the motion model may accept
//! any direction inside an arc bounded by `left` and `right`, and it needs
//! the point the agent is ultimately heading to.  A single admissible
//! direction is expressed by `left == right == pref_dir`.

use glam::Vec2;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrefVelocity {
    /// Left bound of the admissible arc (unit vector).
    pub left:     Vec2,
    /// Right bound of the admissible arc (unit vector).
    pub right:    Vec2,
    /// Preferred direction inside the arc (unit vector, or zero when idle).
    pub pref_dir: Vec2,
    /// Preferred speed along `pref_dir`.
    pub speed:    f32,
    /// The point the agent is ultimately heading toward.
    pub target:   Vec2,
}

impl Default for PrefVelocity {
    fn default() -> Self {
        Self {
            left:     Vec2::X,
            right:    Vec2::X,
            pref_dir: Vec2::ZERO,
            speed:    0.0,
            target:   Vec2::ZERO,
        }
    }
}

impl PrefVelocity {
    /// Collapse the arc to a single direction.  `dir` is normalised; a zero
    /// vector leaves the agent idle.
    pub fn set_single(&mut self, dir: Vec2) {
        let d = dir.normalize_or_zero();
        self.pref_dir = d;
        if d != Vec2::ZERO {
            self.left = d;
            self.right = d;
        }
    }

    /// Set an arc of admissible directions; `pref` is normalised.
    pub fn set_arc(&mut self, left: Vec2, right: Vec2, pref: Vec2) {
        self.left = left.normalize_or_zero();
        self.right = right.normalize_or_zero();
        self.pref_dir = pref.normalize_or_zero();
    }

    /// Stop: zero speed, target at the agent's own position.
    pub fn set_idle(&mut self, pos: Vec2) {
        self.pref_dir = Vec2::ZERO;
        self.speed = 0.0;
        self.target = pos;
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        self.left == self.right
    }

    /// The preferred velocity vector.
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.pref_dir * self.speed
    }

    /// `true` if `dir` lies inside the admissible arc (inclusive).
    pub fn arc_contains(&self, dir: Vec2) -> bool {
        if self.is_single() {
            return dir.normalize_or_zero().abs_diff_eq(self.left, 1e-5);
        }
        // Arc swept counter-clockwise from right to left.
        self.right.perp_dot(dir) >= 0.0 && dir.perp_dot(self.left) >= 0.0
    }
}

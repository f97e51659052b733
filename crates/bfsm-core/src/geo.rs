//! 2D shapes shared by goals and spatial conditions.
//!
//! All queries work on squared distances where possible; callers compare
//! against squared thresholds and only take a root when a length is needed.

use glam::Vec2;

/// A static region in the simulation plane.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "shape", rename_all = "snake_case"))]
pub enum Shape {
    Point {
        pos: Vec2,
    },
    Circle {
        center: Vec2,
        radius: f32,
    },
    /// Axis-aligned box spanning `min..=max`.
    Aabb {
        min: Vec2,
        max: Vec2,
    },
    /// Oriented box: `pivot` is the corner the box rotates around, `size` its
    /// extent along the rotated x/y axes, `angle` the rotation in radians.
    Obb {
        pivot: Vec2,
        size: Vec2,
        angle: f32,
    },
}

impl Shape {
    #[inline]
    pub fn point(pos: Vec2) -> Self {
        Shape::Point { pos }
    }

    #[inline]
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Shape::Circle { center, radius }
    }

    /// Axis-aligned box; corners are normalised so `min <= max` on both axes.
    pub fn aabb(a: Vec2, b: Vec2) -> Self {
        Shape::Aabb { min: a.min(b), max: a.max(b) }
    }

    /// Oriented box with `angle` given in degrees, as description files write it.
    pub fn obb_degrees(pivot: Vec2, size: Vec2, angle_deg: f32) -> Self {
        Shape::Obb { pivot, size: size.abs(), angle: angle_deg.to_radians() }
    }

    /// `true` if `p` lies inside or on the boundary.
    pub fn contains(&self, p: Vec2) -> bool {
        match *self {
            Shape::Point { pos } => pos == p,
            Shape::Circle { center, radius } => center.distance_squared(p) <= radius * radius,
            Shape::Aabb { min, max } => p.cmpge(min).all() && p.cmple(max).all(),
            Shape::Obb { pivot, size, angle } => {
                let local = to_obb_local(p, pivot, angle);
                local.cmpge(Vec2::ZERO).all() && local.cmple(size).all()
            }
        }
    }

    /// The point of the shape closest to `p`; `p` itself when it is inside.
    pub fn nearest_point(&self, p: Vec2) -> Vec2 {
        match *self {
            Shape::Point { pos } => pos,
            Shape::Circle { center, radius } => {
                let d = p - center;
                let len = d.length();
                if len <= radius {
                    p
                } else {
                    center + d * (radius / len)
                }
            }
            Shape::Aabb { min, max } => p.clamp(min, max),
            Shape::Obb { pivot, size, angle } => {
                let local = to_obb_local(p, pivot, angle).clamp(Vec2::ZERO, size);
                pivot + Vec2::from_angle(angle).rotate(local)
            }
        }
    }

    /// Squared distance from `p` to the shape; zero inside.
    #[inline]
    pub fn squared_distance(&self, p: Vec2) -> f32 {
        self.nearest_point(p).distance_squared(p)
    }

    pub fn centroid(&self) -> Vec2 {
        match *self {
            Shape::Point { pos } => pos,
            Shape::Circle { center, .. } => center,
            Shape::Aabb { min, max } => (min + max) * 0.5,
            Shape::Obb { pivot, size, angle } => pivot + Vec2::from_angle(angle).rotate(size * 0.5),
        }
    }
}

#[inline]
fn to_obb_local(p: Vec2, pivot: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(-angle).rotate(p - pivot)
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Point { pos } => write!(f, "point({:.3}, {:.3})", pos.x, pos.y),
            Shape::Circle { center, radius } => {
                write!(f, "circle({:.3}, {:.3}; r={:.3})", center.x, center.y, radius)
            }
            Shape::Aabb { min, max } => {
                write!(f, "aabb({:.3}, {:.3})-({:.3}, {:.3})", min.x, min.y, max.x, max.y)
            }
            Shape::Obb { pivot, size, angle } => write!(
                f,
                "obb({:.3}, {:.3}; {:.3}x{:.3} @ {:.1}deg)",
                pivot.x,
                pivot.y,
                size.x,
                size.y,
                angle.to_degrees()
            ),
        }
    }
}

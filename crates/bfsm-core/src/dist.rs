//! Scalar and 2D value generators.
//!
//! Description files let most numeric parameters be either a constant or a
//! distribution (timer durations, property offsets, goal offsets).  The
//! generators here are plain data; sampling takes whichever RNG stream the
//! caller owns.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::rng::SampleRng;
use crate::{CoreError, CoreResult};

// ── FloatGenerator ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "dist", rename_all = "snake_case"))]
pub enum FloatGenerator {
    Const { value: f32 },
    Uniform { min: f32, max: f32 },
    /// Normal distribution, clamped to `[min, max]`.
    Normal { mean: f32, std: f32, min: f32, max: f32 },
}

impl FloatGenerator {
    #[inline]
    pub fn constant(value: f32) -> Self {
        FloatGenerator::Const { value }
    }

    pub fn uniform(min: f32, max: f32) -> CoreResult<Self> {
        if !(min <= max) {
            return Err(CoreError::Distribution(format!(
                "uniform range is empty: [{min}, {max}]"
            )));
        }
        Ok(FloatGenerator::Uniform { min, max })
    }

    pub fn normal(mean: f32, std: f32, min: f32, max: f32) -> CoreResult<Self> {
        if !(std >= 0.0) {
            return Err(CoreError::Distribution(format!("negative std dev {std}")));
        }
        if !(min <= max) {
            return Err(CoreError::Distribution(format!(
                "normal clamp range is empty: [{min}, {max}]"
            )));
        }
        Ok(FloatGenerator::Normal { mean, std, min, max })
    }

    pub fn sample<R: SampleRng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            FloatGenerator::Const { value } => value,
            FloatGenerator::Uniform { min, max } => rng.uniform(min, max),
            FloatGenerator::Normal { mean, std, min, max } => {
                (mean + std * standard_normal(rng)).clamp(min, max)
            }
        }
    }

    /// Expected value, ignoring the clamp on `Normal`.
    pub fn mean(&self) -> f32 {
        match *self {
            FloatGenerator::Const { value } => value,
            FloatGenerator::Uniform { min, max } => 0.5 * (min + max),
            FloatGenerator::Normal { mean, .. } => mean,
        }
    }
}

impl Default for FloatGenerator {
    fn default() -> Self {
        FloatGenerator::constant(0.0)
    }
}

/// Box-Muller transform; one of the pair is discarded.
fn standard_normal<R: SampleRng + ?Sized>(rng: &mut R) -> f32 {
    // 1 - U keeps the argument of ln in (0, 1].
    let u1 = 1.0 - rng.unit();
    let u2 = rng.unit();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

// ── Vec2Generator ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "dist", rename_all = "snake_case"))]
pub enum Vec2Generator {
    Const { value: Vec2 },
    /// Uniform over an axis-aligned box.
    Aabb { min: Vec2, max: Vec2 },
    /// Uniform over the area of a disk.
    Disk { center: Vec2, radius: f32 },
}

impl Vec2Generator {
    #[inline]
    pub fn constant(value: Vec2) -> Self {
        Vec2Generator::Const { value }
    }

    pub fn aabb(a: Vec2, b: Vec2) -> Self {
        Vec2Generator::Aabb { min: a.min(b), max: a.max(b) }
    }

    pub fn disk(center: Vec2, radius: f32) -> CoreResult<Self> {
        if !(radius >= 0.0) {
            return Err(CoreError::Distribution(format!("negative disk radius {radius}")));
        }
        Ok(Vec2Generator::Disk { center, radius })
    }

    pub fn sample<R: SampleRng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        match *self {
            Vec2Generator::Const { value } => value,
            Vec2Generator::Aabb { min, max } => {
                Vec2::new(rng.uniform(min.x, max.x), rng.uniform(min.y, max.y))
            }
            Vec2Generator::Disk { center, radius } => {
                let r = radius * rng.unit().sqrt();
                center + Vec2::from_angle(TAU * rng.unit()) * r
            }
        }
    }
}

impl Default for Vec2Generator {
    fn default() -> Self {
        Vec2Generator::constant(Vec2::ZERO)
    }
}

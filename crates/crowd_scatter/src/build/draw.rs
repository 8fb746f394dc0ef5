//! Uniform draw helpers for the random template variants.
//!
//! Every documented draw is exactly one `next_u32`, so the per-node draw counts
//! (switch: 1, random: 2, random positioning: 2 per iteration) hold for any
//! injected generator and seeded sequences replay exactly.
use rand::RngCore;

/// Generate a random float in the range [0, 1).
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Generate a uniform random float in [min, max].
#[inline]
pub(crate) fn uniform(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    min + (max - min) * rand01(rng)
}

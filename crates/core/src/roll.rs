//! The d20 roll generator.

use rand::Rng;

/// Number of faces on the die.
pub const DIE_SIDES: i64 = 20;

/// Rolls a d20: uniform in 1..=20, independent across invocations.
///
/// Uses the per-thread generator, so concurrent handlers never contend on
/// shared RNG state. Not cryptographically secure; fairness is the only
/// required property.
pub fn roll_d20() -> i64 {
    roll_d20_with(&mut rand::thread_rng())
}

/// Rolls a d20 with a caller-supplied generator. Tests thread a seeded
/// `StdRng` through here for reproducible sequences.
pub fn roll_d20_with<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(1..=DIE_SIDES)
}

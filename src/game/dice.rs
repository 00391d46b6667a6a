//! Dice: the one source of randomness in the game.
//!
//! Loot rolls, market stock and scavenging all go through a [`DiceRoller`]
//! handed in by the caller, so tests can script every outcome instead of
//! fighting a global RNG.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A six-sided die plus a shuffle, object-safe so the engine can hold one
/// behind a `dyn` pointer.
pub trait DiceRoller: Send {
    /// One d6 roll, 1..=6.
    fn roll_d6(&mut self) -> u8;

    /// Sum of three d6 rolls, 3..=18. Loot and pricing use this shape.
    fn roll_3d6(&mut self) -> u8 {
        self.roll_d6() + self.roll_d6() + self.roll_d6()
    }

    /// A permutation of `0..len`, used to shuffle candidate loot.
    fn shuffle_indices(&mut self, len: usize) -> Vec<usize>;
}

/// The production roller over a seedable standard RNG.
pub struct StdDice {
    rng: StdRng,
}

impl StdDice {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed-seed roller; handy for reproducing a reported game.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl DiceRoller for StdDice {
    fn roll_d6(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }

    fn shuffle_indices(&mut self, len: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        indices.shuffle(&mut self.rng);
        indices
    }
}

/// A test double that plays back a prepared list of d6 values and never
/// shuffles. Panics when the script runs dry, so a test cannot silently
/// drift onto made-up rolls.
pub struct ScriptedDice {
    rolls: VecDeque<u8>,
}

impl ScriptedDice {
    pub fn new<I: IntoIterator<Item = u8>>(rolls: I) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
        }
    }

    /// A script of 3d6 sums: each sum is decomposed into three d6 values.
    /// Only sums in 3..=18 are representable.
    pub fn from_3d6_sums<I: IntoIterator<Item = u8>>(sums: I) -> Self {
        let mut rolls = VecDeque::new();
        for sum in sums {
            assert!((3..=18).contains(&sum), "not a 3d6 sum: {}", sum);
            let mut rest = sum;
            for die in [0, 1, 2] {
                let remaining_dice = 2 - die;
                let value = (rest - remaining_dice).min(6).max(1);
                rolls.push_back(value);
                rest -= value;
            }
        }
        Self { rolls }
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl DiceRoller for ScriptedDice {
    fn roll_d6(&mut self) -> u8 {
        self.rolls
            .pop_front()
            .unwrap_or_else(|| panic!("scripted dice exhausted"))
    }

    fn shuffle_indices(&mut self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dice_stay_in_range() {
        let mut dice = StdDice::seeded(7);
        for _ in 0..200 {
            let roll = dice.roll_d6();
            assert!((1..=6).contains(&roll));
        }
        for _ in 0..50 {
            let sum = dice.roll_3d6();
            assert!((3..=18).contains(&sum));
        }
    }

    #[test]
    fn seeded_dice_are_reproducible() {
        let a: Vec<u8> = {
            let mut dice = StdDice::seeded(42);
            (0..20).map(|_| dice.roll_d6()).collect()
        };
        let b: Vec<u8> = {
            let mut dice = StdDice::seeded(42);
            (0..20).map(|_| dice.roll_d6()).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut dice = StdDice::seeded(3);
        let mut order = dice.shuffle_indices(8);
        order.sort_unstable();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn scripted_sums_decompose_correctly() {
        let mut dice = ScriptedDice::from_3d6_sums([12, 5, 18, 3]);
        assert_eq!(dice.roll_3d6(), 12);
        assert_eq!(dice.roll_3d6(), 5);
        assert_eq!(dice.roll_3d6(), 18);
        assert_eq!(dice.roll_3d6(), 3);
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "scripted dice exhausted")]
    fn scripted_dice_panic_when_dry() {
        let mut dice = ScriptedDice::new([1]);
        dice.roll_d6();
        dice.roll_d6();
    }
}

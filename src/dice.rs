// Dice used by the turn engine for movement and gamble resolution.
use std::collections::VecDeque;
use std::sync::Mutex;

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

pub const DICE_FACES: u8 = 6;

/// Source of six-sided die rolls. Implementations must return values in `1..=6`.
pub trait DiceRoller: Send + Sync {
    fn roll(&self) -> u8;
}

/// Uniform die backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDice;

impl DiceRoller for RandomDice {
    fn roll(&self) -> u8 {
        rand::thread_rng().gen_range(1..=DICE_FACES)
    }
}

/// Reproducible die for simulations.
pub struct SeededDice {
    rng: Mutex<XorShiftRng>,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(XorShiftRng::seed_from_u64(seed)),
        }
    }
}

impl DiceRoller for SeededDice {
    fn roll(&self) -> u8 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(1..=DICE_FACES),
            // A poisoned lock still holds a usable RNG
            Err(poisoned) => poisoned.into_inner().gen_range(1..=DICE_FACES),
        }
    }
}

/// Scripted die: returns the queued values in order, then repeats the last one.
pub struct FixedDice {
    rolls: Mutex<VecDeque<u8>>,
    last: Mutex<u8>,
}

impl FixedDice {
    pub fn new(rolls: impl IntoIterator<Item = u8>) -> Self {
        let rolls: VecDeque<u8> = rolls
            .into_iter()
            .map(|r| r.clamp(1, DICE_FACES))
            .collect();
        let last = rolls.back().copied().unwrap_or(1);
        Self {
            rolls: Mutex::new(rolls),
            last: Mutex::new(last),
        }
    }

    pub fn push(&self, roll: u8) {
        if let Ok(mut rolls) = self.rolls.lock() {
            rolls.push_back(roll.clamp(1, DICE_FACES));
        }
    }
}

impl DiceRoller for FixedDice {
    fn roll(&self) -> u8 {
        let next = self.rolls.lock().ok().and_then(|mut rolls| rolls.pop_front());
        match (next, self.last.lock()) {
            (Some(roll), Ok(mut last)) => {
                *last = roll;
                roll
            }
            (Some(roll), Err(_)) => roll,
            (None, Ok(last)) => *last,
            (None, Err(_)) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_dice_stays_in_range() {
        let dice = RandomDice;
        for _ in 0..500 {
            let roll = dice.roll();
            assert!((1..=6).contains(&roll));
        }
    }

    #[test]
    fn test_seeded_dice_is_reproducible() {
        let a = SeededDice::new(42);
        let b = SeededDice::new(42);
        let first: Vec<u8> = (0..20).map(|_| a.roll()).collect();
        let second: Vec<u8> = (0..20).map(|_| b.roll()).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|r| (1..=6).contains(r)));
    }

    #[test]
    fn test_fixed_dice_replays_then_repeats() {
        let dice = FixedDice::new([2, 5]);
        assert_eq!(dice.roll(), 2);
        assert_eq!(dice.roll(), 5);
        assert_eq!(dice.roll(), 5);
        dice.push(9);
        assert_eq!(dice.roll(), 6);
    }
}

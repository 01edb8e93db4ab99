//! # Dice
//!
//! Every random decision in the engine is expressed as one of these rolls so
//! that a seeded generator replays a run exactly.

use rand::Rng;

/// Rolls a twenty-sided die, returning a value in `1..=20`.
pub fn roll_d20<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(1..=20)
}

/// Flips a fair coin.
pub fn coin_flip<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen_bool(0.5)
}

/// Percentage check used for condition application and lifesteal.
///
/// Succeeds when `d20 * 5 >= 100 - chance * 100`, so a chance of `1.0`
/// always succeeds and a chance of `0.0` still succeeds on a natural 20.
///
/// # Examples
///
/// ```
/// use delve::roll_chance;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// assert!(roll_chance(&mut rng, 1.0));
/// ```
pub fn roll_chance<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    let roll = roll_d20(rng) as f64;
    roll * 5.0 >= 100.0 - chance * 100.0
}

/// Drop check: succeeds when `d20 >= 20 - chance * 20`.
pub fn roll_drop<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    let roll = roll_d20(rng) as f64;
    roll >= 20.0 - chance * 20.0
}

/// Picks an integer uniformly from the inclusive range `[min, max]`.
///
/// Reversed bounds are swapped rather than rejected.
pub fn number_in_range<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    rng.gen_range(low..=high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_d20_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let roll = roll_d20(&mut rng);
            assert!((1..=20).contains(&roll));
        }
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..200 {
            assert!(roll_chance(&mut rng, 1.0));
            assert!(roll_drop(&mut rng, 1.0));
        }
        // A zero chance only passes on a natural 20
        let hits = (0..2000).filter(|_| roll_chance(&mut rng, 0.0)).count();
        assert!(hits > 0 && hits < 250);
    }

    #[test]
    fn test_number_in_range_inclusive() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..500 {
            let n = number_in_range(&mut rng, 3, 5);
            assert!((3..=5).contains(&n));
            seen_min |= n == 3;
            seen_max |= n == 5;
        }
        assert!(seen_min && seen_max);
        assert_eq!(number_in_range(&mut rng, 4, 4), 4);
        assert!((1..=9).contains(&number_in_range(&mut rng, 9, 1)));
    }
}

//! # Utilities Module
//!
//! Dice rolls, damage arithmetic and text helpers shared by the combat and
//! generation systems.

pub mod dice;
pub mod math;

pub use dice::*;
pub use math::*;

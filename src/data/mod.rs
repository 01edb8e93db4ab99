//! # Data Module
//!
//! Read-only content tables consumed by combat and generation.
//!
//! Content is authored as JSON and loaded once into [`Definitions`]. Every
//! lookup is by exact name and fails with [`crate::DelveError::UnknownDefinition`]
//! when the name is absent, so a typo in content data surfaces as an error at
//! the first use instead of a silently skipped effect.

pub mod definitions;

pub use definitions::*;

/// Bundled sample content used by the demo binary and the integration tests.
pub const SAMPLE_DEFINITIONS: &str = include_str!("../../assets/definitions.json");

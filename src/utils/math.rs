//! # Game Mathematics
//!
//! Damage arithmetic and display-name helpers.

use crate::config::MAX_DAMAGE_REDUCTION;

/// Rounds to the nearest quarter point.
///
/// # Examples
///
/// ```
/// use delve::round_to_quarter;
///
/// assert_eq!(round_to_quarter(7.3), 7.25);
/// assert_eq!(round_to_quarter(7.4), 7.5);
/// ```
pub fn round_to_quarter(value: f64) -> f64 {
    (value * 4.0).round() / 4.0
}

/// Fraction of incoming damage absorbed by the given armor value.
///
/// Follows `92.5 * (1 - e^(-0.01 * armor))` percent, saturating at 92.5%.
/// Negative armor absorbs nothing.
pub fn damage_reduction(armor: f64) -> f64 {
    if armor <= 0.0 {
        return 0.0;
    }
    if armor >= 600.0 {
        return MAX_DAMAGE_REDUCTION;
    }
    let percent = (MAX_DAMAGE_REDUCTION * 100.0) * (1.0 - (-0.01 * armor).exp());
    percent.min(MAX_DAMAGE_REDUCTION * 100.0) / 100.0
}

/// Capitalizes the first letter of every word, treating spaces and hyphens
/// as word boundaries.
///
/// # Examples
///
/// ```
/// use delve::to_title_case;
///
/// assert_eq!(to_title_case("giant rat"), "Giant Rat");
/// assert_eq!(to_title_case("half-orc brute"), "Half-Orc Brute");
/// ```
pub fn to_title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut capitalize = true;
    for ch in text.chars() {
        if capitalize {
            result.extend(ch.to_uppercase());
        } else {
            result.extend(ch.to_lowercase());
        }
        capitalize = ch == ' ' || ch == '-';
    }
    result
}

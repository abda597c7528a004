//! Permille Ratios
//!
//! Accuracy, accuracy boosts, and life-steal ratios are integers in
//! thousandths. `PERMILLE_ONE` (1000) is 100%.
//!
//! Using integers keeps combat math reproducible: `0.8` is `800`,
//! `0.25` is `250`, and every product rounds down.

/// A ratio expressed in thousandths.
pub type Permille = u32;

/// 100% as a permille value.
pub const PERMILLE_ONE: Permille = 1000;

/// Multiply `value` by `ratio`, rounding down.
///
/// ```
/// use duel_arena::core::permille::apply_permille;
///
/// assert_eq!(apply_permille(25, 250), 6); // floor(25 * 0.25)
/// assert_eq!(apply_permille(50, 2000), 100);
/// ```
#[inline]
pub fn apply_permille(value: u32, ratio: Permille) -> u32 {
    let product = value as u64 * ratio as u64 / PERMILLE_ONE as u64;
    product.min(u32::MAX as u64) as u32
}

/// Cap a probability at 100%.
#[inline]
pub fn clamp_permille(ratio: Permille) -> Permille {
    ratio.min(PERMILLE_ONE)
}

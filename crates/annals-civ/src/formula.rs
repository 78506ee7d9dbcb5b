//! Shared formulas and float-to-integer conversions.
//!
//! Every cost and threshold in the simulation is computed here so the
//! managers agree on rounding. Percentage totals come from a
//! [`ModifierLedger`](crate::modifier::ModifierLedger) and scale a base as
//! `base * (1 + pct / 100)`.

/// Tolerance absorbed before rounding, so `10 * 1.1` ceils to 11, not 12.
const ROUNDING_SLACK: f64 = 1e-9;

/// Food a city of `population` needs in its bank to grow: `15 + 8(p - 1)`.
pub const fn food_needed(population: u32) -> u32 {
    let extra = population.saturating_sub(1).saturating_mul(8);
    15_u32.saturating_add(extra)
}

/// Food eaten per turn by a city of `population`: `2p`.
pub const fn food_consumption(population: u32) -> u32 {
    population.saturating_mul(2)
}

/// Culture cost of the next tile after `tiles_acquired` tiles:
/// `ceil((10 + 4t + t^1.5) * (1 + pct/100))`.
pub fn tile_culture_cost(tiles_acquired: u32, cost_pct: f64) -> u32 {
    let t = f64::from(tiles_acquired);
    // t * sqrt(t) keeps perfect squares exact, unlike powf(1.5).
    let base = 4.0f64.mul_add(t, 10.0) + t * t.sqrt();
    ceil_u32(base * multiplier(cost_pct))
}

/// Culture cost of the next policy after `adopted` policies:
/// `ceil((25 + 2.5n^2) * (1 + pct/100))`.
pub fn policy_cost(adopted: u32, cost_pct: f64) -> u32 {
    let n = f64::from(adopted);
    let base = (2.5 * n).mul_add(n, 25.0);
    ceil_u32(base * multiplier(cost_pct))
}

/// Percentage multiplier `1 + pct/100`, never negative.
pub fn multiplier(pct: f64) -> f64 {
    (1.0 + pct / 100.0).max(0.0)
}

/// `floor(base * (1 + pct/100))`.
pub fn scaled_floor(base: u32, pct: f64) -> u32 {
    floor_u32(f64::from(base) * multiplier(pct))
}

/// `ceil(base * (1 + pct/100))`.
pub fn scaled_ceil(base: u32, pct: f64) -> u32 {
    ceil_u32(f64::from(base) * multiplier(pct))
}

/// Ceil to `u32`, saturating at the bounds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn ceil_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // `as` saturates for out-of-range floats.
    (value - ROUNDING_SLACK).ceil() as u32
}

/// Floor to `u32`, saturating at the bounds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn floor_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    (value + ROUNDING_SLACK).floor() as u32
}

/// Round a flat modifier total to the nearest integer.
#[allow(clippy::cast_possible_truncation)]
pub fn round_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    value.round() as i64
}

/// `ceil(numerator / denominator)` for a non-zero denominator.
pub const fn div_ceil(numerator: u32, denominator: u32) -> Option<u32> {
    if denominator == 0 {
        return None;
    }
    Some(numerator.div_ceil(denominator))
}

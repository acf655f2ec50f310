use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Simulation ticks per real-time second.
pub const TICKS_PER_SECOND: u32 = 60;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Convert a per-second rate to a per-tick rate.
#[inline]
pub fn per_second(amount_per_second: Fixed64) -> Fixed64 {
    amount_per_second / Fixed64::from_num(TICKS_PER_SECOND)
}

/// Convert a duration in seconds to ticks.
#[inline]
pub fn seconds(seconds: Fixed64) -> Fixed64 {
    seconds * Fixed64::from_num(TICKS_PER_SECOND)
}

/// Clamp a value into `[0, 1]`.
#[inline]
pub fn clamp01(v: Fixed64) -> Fixed64 {
    v.clamp(Fixed64::ZERO, Fixed64::ONE)
}

/// Move `from` toward `to` by at most `step`, never overshooting.
///
/// A non-positive step leaves `from` unchanged.
pub fn approach(from: Fixed64, to: Fixed64, step: Fixed64) -> Fixed64 {
    if step <= Fixed64::ZERO {
        return from;
    }
    if from < to {
        (from + step).min(to)
    } else {
        from.saturating_sub(step).max(to)
    }
}

/// Division that rounds up to the next representable step.
///
/// Returns `None` on a zero divisor. Rounding up means `n` additions of
/// `div_ceil(1, n)` always reach at least 1.
pub fn div_ceil(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    let q = a.checked_div(b)?;
    if q.saturating_mul(b) < a {
        Some(q.saturating_add(Fixed64::DELTA))
    } else {
        Some(q)
    }
}

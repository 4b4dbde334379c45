//! Clamped and saturating arithmetic for buffer positions.
//!
//! Positions are unsigned offsets into a buffer, so every helper here keeps
//! its result inside an explicit bound instead of wrapping or panicking.

/// Clamp `x` into the inclusive range `lo..=hi`.
///
/// If `lo > hi` the lower bound wins.
#[inline]
pub fn clamp(x: u64, lo: u64, hi: u64) -> u64 {
    if x < lo {
        lo
    } else if x > hi {
        hi.max(lo)
    } else {
        x
    }
}

/// `x + y`, saturating at `b - 1`.
///
/// `b` is an exclusive upper bound and must be at least 1.
#[inline]
pub fn satadd(x: u64, y: u64, b: u64) -> u64 {
    debug_assert!(b >= 1, "satadd: bound must be at least 1");
    let last = b.saturating_sub(1);
    x.saturating_add(y).min(last)
}

/// `x - y`, saturating at `a`.
#[inline]
pub fn satsub(x: u64, y: u64, a: u64) -> u64 {
    match x.checked_sub(y) {
        Some(n) if n >= a => n,
        _ => a,
    }
}

/// `x + y` if the result stays below `b`, otherwise `x` unchanged.
#[inline]
pub fn satinc(x: u64, y: u64, b: u64) -> u64 {
    match x.checked_add(y) {
        Some(n) if n < b => n,
        _ => x,
    }
}

/// `x - y` if the result stays at or above `a`, otherwise `x` unchanged.
#[inline]
pub fn satdec(x: u64, y: u64, a: u64) -> u64 {
    match x.checked_sub(y) {
        Some(n) if n >= a => n,
        _ => x,
    }
}

#[inline]
pub fn absdiff(x: u64, y: u64) -> u64 {
    if x > y {
        x - y
    } else {
        y - x
    }
}

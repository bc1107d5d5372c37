//! Power-of-two helpers used to lay out a track.

/// Largest power of two that is less than or equal to `x`.
///
/// Panics when `x` is zero.
#[inline]
pub fn floor_po2(x: u64) -> u64 {
    assert!(x != 0, "window: floor_po2 is undefined for 0");
    1 << (u64::BITS - 1 - x.leading_zeros())
}

/// Smallest power of two that is greater than or equal to `x`. `ceil_po2(0)` is 1.
#[inline]
pub fn ceil_po2(x: u64) -> u64 {
    match x.checked_next_power_of_two() {
        Some(po2) => po2,
        None => panic!("window: {x} has no power of two ceiling in 64 bits"),
    }
}

/// Number of consecutive set bits starting at the least significant bit.
///
/// For a mask of the form `2^k - 1` this is `k`, the shift matching the mask.
#[inline]
pub fn trailing_ones(x: u64) -> u32 {
    x.trailing_ones()
}

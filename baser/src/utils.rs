//! Utilities.

/// Returns a mask of the low `width` bits.
pub const fn mask_u64(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

/// Returns a mask of the low `width` bits.
pub const fn mask_u128(width: usize) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1 << width) - 1
    }
}

/// Returns `value` with its low `width` bits in reverse order.
///
/// Bits above `width` are dropped.
///
/// ### Example
/// ```ignore
/// assert_eq!(bit_reverse(0b0011, 4), 0b1100);
/// ```
pub fn bit_reverse(value: u64, width: usize) -> u64 {
    if width == 0 {
        return 0;
    }
    value.reverse_bits() >> (64 - width.min(64))
}

/// Returns bit `index` of `value`.
#[inline]
pub const fn bit(value: u64, index: usize) -> bool { (value >> index) & 1 != 0 }

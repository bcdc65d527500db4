//! Size-class mapping tables shared by the buddy and slab subsystems.
//!
//! Buddy classes are a plain power-of-two ladder starting at the page size.
//! Slab classes follow a piecewise ladder (32-byte steps, then 64-byte
//! steps, then a harmonic-ish tail) so that the worst-case internal
//! fragmentation stays bounded across the whole [32, 32768] range.

/// Every buddy page and every slab page is a multiple of this size.
pub const PAGE_SHIFT: u32 = 16;
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

/// Number of buddy size classes: `[2^16, 2^47]`.
pub const BUDDY_CLASSES: usize = 32;

/// Number of slab size classes: `[32, 32768]`.
pub const SLAB_CLASSES: usize = 64;

/// Requests normalizing to more than this many bytes skip the slab
/// subsystem entirely and go straight to the buddy allocator.
pub const MAX_SLAB_BYTES: usize = 32_768;

/// `2^(16+k)`, the byte size of a class-`k` buddy block.
pub fn buddy_to_bytes(k: u32) -> usize {
    1usize << (PAGE_SHIFT + k)
}

/// The smallest buddy class whose block is `>= size` bytes.
///
/// Sizes at or below the page size collapse to class 0: a buddy block is
/// never smaller than a page.
pub fn bytes_to_buddy(size: usize) -> u32 {
    if size <= PAGE_SIZE {
        0
    } else {
        let rounded = size.next_power_of_two();
        rounded.trailing_zeros() - PAGE_SHIFT
    }
}

/// The largest buddy class `k` with `buddy_to_bytes(k) <= bytes`, or `None`
/// if `bytes` can't hold even a single page.
pub fn largest_fitting_buddy_class(bytes: usize) -> Option<u32> {
    if bytes < PAGE_SIZE {
        return None;
    }
    let mut k = 0u32;
    while (k as usize) + 1 < BUDDY_CLASSES && buddy_to_bytes(k + 1) <= bytes {
        k += 1;
    }
    Some(k)
}

/// The byte size of a class-`p` slab item, `0 <= p < 64`.
///
/// Ported from the reference implementation's own ladder, not the rounded
/// prose description in the design notes: classes 0..=2 step by 32 bytes,
/// 3..=31 step by 64 bytes, and 32..=63 follow `8192 / (65 - p) * 8`.
pub fn page_to_bytes(p: usize) -> usize {
    if p <= 2 {
        32 * (p + 1)
    } else if p < 32 {
        64 * (p - 3) + 128
    } else {
        8192 / (65 - p) * 8
    }
}

/// The smallest slab class whose item is `>= size` bytes, `1 <= size <= 32768`.
pub fn bytes_to_page(size: usize) -> usize {
    if size <= 96 {
        (size + 31) / 32 - 1
    } else if size <= 1920 {
        (size - 65) / 64 + 3
    } else {
        65 - 8192 / ((size + 7) / 8)
    }
}

// The two ladders must agree at every boundary: page_to_bytes(bytes_to_page(x))
// always rounds up, never down, and the three piecewise branches must not
// overlap or leave a gap.
static_assertions::const_assert_eq!(32 * (0 + 1), 32);
static_assertions::const_assert_eq!(32 * (2 + 1), 96);
static_assertions::const_assert_eq!(64 * (3 - 3) + 128, 128);
static_assertions::const_assert!(32 * (2 + 1) < 64 * (3 - 3) + 128);
static_assertions::const_assert_eq!(64 * (31 - 3) + 128, 1920);
static_assertions::const_assert_eq!(8192 / (65 - 32) * 8, 1984);
static_assertions::const_assert!(64 * (31 - 3) + 128 < 8192 / (65 - 32) * 8);
static_assertions::const_assert_eq!(8192 / (65 - 63) * 8, 32768);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buddy_round_trip_at_class_boundaries() {
        for k in 0..BUDDY_CLASSES as u32 {
            let bytes = buddy_to_bytes(k);
            assert_eq!(bytes_to_buddy(bytes), k);
            assert_eq!(bytes_to_buddy(bytes + 1), k + 1);
            if k > 0 {
                let prev = buddy_to_bytes(k - 1);
                assert_eq!(bytes_to_buddy(prev), k - 1);
                assert_eq!(bytes_to_buddy(prev + 1), k);
            }
        }
    }

    #[test]
    fn slab_ladder_is_monotonic_and_covers_every_size() {
        let mut prev = 0;
        for p in 0..SLAB_CLASSES {
            let bytes = page_to_bytes(p);
            assert!(bytes > prev, "class {p} did not grow: {prev} -> {bytes}");
            prev = bytes;
        }
        assert_eq!(page_to_bytes(0), 32);
        assert_eq!(page_to_bytes(SLAB_CLASSES - 1), MAX_SLAB_BYTES);
    }

    #[test]
    fn slab_inverse_property_holds_across_the_whole_range() {
        for size in 1..=MAX_SLAB_BYTES {
            let p = bytes_to_page(size);
            assert!(page_to_bytes(p) >= size, "class {p} too small for {size}");
            if p > 0 {
                assert!(
                    page_to_bytes(p - 1) < size,
                    "class {} should not have sufficed for {size}",
                    p - 1
                );
            }
        }
    }

    #[test]
    fn largest_fitting_buddy_class_picks_the_biggest_block_that_fits() {
        assert_eq!(largest_fitting_buddy_class(PAGE_SIZE - 1), None);
        assert_eq!(largest_fitting_buddy_class(PAGE_SIZE), Some(0));
        assert_eq!(largest_fitting_buddy_class(PAGE_SIZE * 2 - 1), Some(0));
        assert_eq!(largest_fitting_buddy_class(PAGE_SIZE * 2), Some(1));
    }
}

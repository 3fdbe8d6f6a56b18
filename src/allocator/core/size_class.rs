use crate::allocator::constants::{LARGE_THRESHOLD, MIN_BLOCK_SIZE, PAGE_SIZE, SIZE_CLASS_COUNT};

const MIN_SHIFT: u32 = MIN_BLOCK_SIZE.trailing_zeros();

/// How a request of a given size is serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRoute {
    /// Size-class path: index into the size-class table.
    Class(usize),
    /// Large-object path: this many whole pages.
    Large(usize),
}

/// Returns the size class index for a given size.
/// Supports sizes from 1 to 2048 bytes.
/// Classes: 16, 32, 64, 128, 256, 512, 1024, 2048.
/// Indices: 0, 1, 2, 3, 4, 5, 6, 7.
///
/// Exact powers of two map to their own class.
#[inline]
pub const fn class_index(size: usize) -> Option<usize> {
    if size == 0 || size > LARGE_THRESHOLD {
        return None;
    }
    let size = if size < MIN_BLOCK_SIZE { MIN_BLOCK_SIZE } else { size };
    let shift = size.next_power_of_two().trailing_zeros();
    Some((shift - MIN_SHIFT) as usize)
}

/// Returns the block size for a given class index.
#[inline]
pub const fn block_size(index: usize) -> usize {
    debug_assert!(index < SIZE_CLASS_COUNT);
    MIN_BLOCK_SIZE << index
}

/// Number of whole pages needed to hold `size` bytes, or None on overflow.
#[inline]
pub const fn pages_for(size: usize) -> Option<usize> {
    match size.checked_add(PAGE_SIZE - 1) {
        Some(padded) => Some(padded / PAGE_SIZE),
        None => None,
    }
}

/// Routes a non-zero request to the path that will serve it.
///
/// `None` means the large-object rounding overflowed.
#[inline]
pub const fn route(size: usize) -> Option<SizeRoute> {
    let size = if size < MIN_BLOCK_SIZE { MIN_BLOCK_SIZE } else { size };
    if size > LARGE_THRESHOLD {
        return match pages_for(size) {
            Some(pages) => Some(SizeRoute::Large(pages)),
            None => None,
        };
    }
    match class_index(size) {
        Some(index) => Some(SizeRoute::Class(index)),
        None => None,
    }
}

pub const fn align_up(value: usize, align: usize) -> usize {
    (value + (align - 1)) & !(align - 1)
}

pub const fn align_down(value: usize, align: usize) -> usize {
    value & !(align - 1)
}

/// The system page size (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Smallest block handed out by the size-class path.
pub const MIN_BLOCK_SIZE: usize = 16;

/// Requests above this many bytes bypass size classing.
pub const LARGE_THRESHOLD: usize = 2048;

/// Number of power-of-two size classes (16 through 2048).
pub const SIZE_CLASS_COUNT: usize = 8;

/// Sentinel stored at the start of every size-class page.
pub const PAGE_MAGIC: u32 = 0xF00D_FACE;

/// Bytes reserved for allocations made while reporting a fatal error.
pub const EMERGENCY_BLOCK_SIZE: usize = 1024;

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(MIN_BLOCK_SIZE.is_power_of_two());
    assert!(LARGE_THRESHOLD.is_power_of_two());
    assert!(MIN_BLOCK_SIZE << (SIZE_CLASS_COUNT - 1) == LARGE_THRESHOLD);
    assert!(LARGE_THRESHOLD < PAGE_SIZE);
    // A free block must be able to hold the freelist link.
    assert!(MIN_BLOCK_SIZE >= core::mem::size_of::<usize>());
};

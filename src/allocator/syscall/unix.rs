#![cfg(unix)]

use core::ptr::{self, NonNull};
use libc::{c_void, mmap, munmap, MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE};

/// Maps `size` bytes of anonymous, zero-filled memory.
/// Returns the page-aligned start of the region, or None if the kernel refused.
///
/// # Safety
/// `size` must be a non-zero multiple of the page size.
pub unsafe fn map_region(size: usize) -> Option<NonNull<u8>> {
    let ptr = mmap(
        ptr::null_mut(),
        size,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
    );

    if ptr == MAP_FAILED {
        None
    } else {
        NonNull::new(ptr.cast::<u8>())
    }
}

/// # Safety
/// `ptr` and `size` must describe a region returned by `map_region`.
pub unsafe fn unmap_region(ptr: NonNull<u8>, size: usize) {
    munmap(ptr.as_ptr().cast::<c_void>(), size);
}

/// Writes `msg` straight to stderr without touching the heap.
pub fn write_stderr(msg: &[u8]) {
    // Best effort: a short write during a fatal report is not retried.
    unsafe {
        libc::write(libc::STDERR_FILENO, msg.as_ptr().cast::<c_void>(), msg.len());
    }
}

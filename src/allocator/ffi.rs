//! C entry points over the process-wide heap.
//!
//! The symbols are prefixed so that the library can be linked next to the
//! platform allocator; an `LD_PRELOAD` shim maps `malloc`, `free` and
//! `malloc_usable_size` onto them.

use super::global;
use core::ffi::c_void;

/// Allocates `size` bytes. Returns null only for `size == 0`.
#[no_mangle]
pub extern "C" fn segalloc_malloc(size: usize) -> *mut c_void {
    global::malloc(size).cast()
}

/// # Safety
/// `ptr` must be null or returned by `segalloc_malloc` and not yet freed.
#[no_mangle]
pub unsafe extern "C" fn segalloc_free(ptr: *mut c_void) {
    global::free(ptr.cast());
}

/// # Safety
/// Same as `segalloc_free`.
#[no_mangle]
pub unsafe extern "C" fn segalloc_malloc_usable_size(ptr: *const c_void) -> usize {
    global::usable_size(ptr.cast())
}

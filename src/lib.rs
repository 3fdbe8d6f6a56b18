//! # `segalloc` - Segregated Size-Class Page Allocator
//!
//! A drop-in dynamic-memory allocator. Small requests are served from
//! power-of-two size classes carved out of 4KB pages; large requests map
//! whole pages straight from the operating system.
//!
//! ## Architecture
//!
//! 1. **Page source** (`PageSource`): supplies zero-filled, page-aligned
//!    memory. `SystemPages` maps from the OS, `ReservedArena` bump-allocates
//!    pages out of one up-front reservation.
//!
//! 2. **Size-class table** (`Heap`): eight classes, 16 through 2048 bytes.
//!    Each class points at the page it currently allocates from; older pages
//!    of the class stay reachable through a back-link in the page header.
//!
//! 3. **Pages**: a header at offset 0 carries a validity marker, the block
//!    size, and the head of an intrusive freelist threaded through the page's
//!    free blocks. Allocation pops the head, release pushes onto it.
//!
//! 4. **Large objects**: anything above 2048 bytes is rounded up to whole
//!    pages and mapped directly. These regions carry no header.
//!
//! 5. **Pointer classification**: release and usable-size round a pointer
//!    down to its page and check the validity marker before trusting the
//!    header. Unrecognised pointers are left alone.
//!
//! ## Threading
//!
//! A `Heap` is one allocation stream and is not `Sync`. The process-wide
//! `PageMalloc` puts a single heap behind a spin lock so it can be installed as
//! the global allocator.
//!
//! ## Example
//!
//! ```rust
//! use segalloc::Heap;
//!
//! let mut heap = Heap::new();
//! let p = heap.allocate(64).unwrap().unwrap();
//! unsafe {
//!     assert_eq!(heap.usable_size(p.as_ptr()), 64);
//!     heap.release(p.as_ptr());
//! }
//! assert_eq!(heap.allocate(64).unwrap(), Some(p));
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod allocator;

pub use allocator::{
    AllocError, AllocObserver, Heap, NoopObserver, PageMalloc, PageSource, ReservedArena,
    SystemPages,
};
#[cfg(feature = "tracing")]
pub use allocator::TracingObserver;

use super::constants::PAGE_SIZE;
use super::syscall::{map_region, unmap_region};
use core::ptr::NonNull;

/// A supplier of page-aligned, zero-filled memory.
///
/// This is the only way a `Heap` obtains memory. Implementations are free to
/// block, and signal failure by returning `None`.
pub trait PageSource {
    /// Maps `pages` contiguous pages.
    ///
    /// The returned region must be aligned to `PAGE_SIZE`, zero-filled, and
    /// exclusively owned by the caller until passed back to `unmap_pages`.
    fn map_pages(&self, pages: usize) -> Option<NonNull<u8>>;

    /// Returns a region to the source.
    ///
    /// # Safety
    /// `ptr` must have been returned by `map_pages(pages)` on this source and not
    /// unmapped since. No references into the region may outlive this call.
    unsafe fn unmap_pages(&self, ptr: NonNull<u8>, pages: usize);
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn map_pages(&self, pages: usize) -> Option<NonNull<u8>> {
        (**self).map_pages(pages)
    }

    unsafe fn unmap_pages(&self, ptr: NonNull<u8>, pages: usize) {
        (**self).unmap_pages(ptr, pages);
    }
}

/// A page source that maps directly from the operating system
/// (`mmap` on unix, `VirtualAlloc` on windows).
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemPages;

impl PageSource for SystemPages {
    fn map_pages(&self, pages: usize) -> Option<NonNull<u8>> {
        let size = pages.checked_mul(PAGE_SIZE)?;
        if size == 0 {
            return None;
        }
        unsafe { map_region(size) }
    }

    unsafe fn unmap_pages(&self, ptr: NonNull<u8>, pages: usize) {
        unmap_region(ptr, pages * PAGE_SIZE);
    }
}

use super::super::constants::PAGE_SIZE;
use super::super::source::PageSource;
use super::super::syscall;
use core::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A bump page source over one virtual memory region reserved up front.
///
/// Pages are handed out in address order and never reused, so every page is
/// still zero-filled when it is returned. Once the reservation is used up,
/// `map_pages` fails; this is how a heap is run inside a hard memory budget.
pub struct ReservedArena {
    start: NonNull<u8>,
    size: usize,
    cursor: AtomicUsize,
}

impl ReservedArena {
    /// Reserves a region of `pages` pages.
    pub fn new(pages: usize) -> Option<Self> {
        let size = pages.checked_mul(PAGE_SIZE)?;
        if size == 0 {
            return None;
        }
        let start = unsafe { syscall::map_region(size)? };
        Some(Self {
            start,
            size,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Returns the capacity of the arena in bytes.
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Returns the number of bytes handed out so far.
    pub fn used(&self) -> usize {
        self.cursor.load(Ordering::SeqCst).min(self.size)
    }

    /// Whether `ptr` points into the reserved region.
    pub fn contains(&self, ptr: *const u8) -> bool {
        let base = self.start.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= base && addr < base + self.size
    }
}

impl PageSource for ReservedArena {
    fn map_pages(&self, pages: usize) -> Option<NonNull<u8>> {
        let bytes = pages.checked_mul(PAGE_SIZE)?;
        if bytes == 0 {
            return None;
        }
        let mut offset = self.cursor.load(Ordering::SeqCst);
        loop {
            let end = offset.checked_add(bytes)?;
            if end > self.size {
                return None;
            }
            match self
                .cursor
                .compare_exchange(offset, end, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(actual) => offset = actual,
            }
        }
        unsafe { Some(NonNull::new_unchecked(self.start.as_ptr().add(offset))) }
    }

    unsafe fn unmap_pages(&self, _ptr: NonNull<u8>, _pages: usize) {
        // Pages go back to the OS only when the whole arena is dropped.
    }
}

unsafe impl Send for ReservedArena {}
unsafe impl Sync for ReservedArena {}

impl Drop for ReservedArena {
    fn drop(&mut self) {
        unsafe {
            syscall::unmap_region(self.start, self.size);
        }
    }
}

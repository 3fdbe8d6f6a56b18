use super::page::PageRef;
use super::size_class::{block_size, pages_for, route, SizeRoute};
use crate::allocator::constants::{LARGE_THRESHOLD, PAGE_SIZE, SIZE_CLASS_COUNT};
use crate::allocator::error::AllocError;
use crate::allocator::observer::{AllocObserver, NoopObserver};
use crate::allocator::source::{PageSource, SystemPages};
use core::ptr::NonNull;

/// A segregated size-class heap.
///
/// Requests up to 2048 bytes are rounded to one of eight power-of-two classes
/// and served from pages carved into blocks of that class. Larger requests
/// map whole pages straight from the page source.
///
/// A `Heap` is a single allocation stream: it is not `Sync`, and every
/// operation takes it by reference. It can be moved to another thread, since
/// it exclusively owns every page it has mapped.
///
/// Size-class pages are kept until the heap is dropped. Large objects are
/// not tracked and `release` cannot recognise them; see `release_large`.
pub struct Heap<P: PageSource = SystemPages, O: AllocObserver = NoopObserver> {
    // Most recently bootstrapped page per class. Older pages hang off `prior`.
    table: [Option<PageRef>; SIZE_CLASS_COUNT],
    source: P,
    observer: O,
}

unsafe impl<P: PageSource + Send, O: AllocObserver + Send> Send for Heap<P, O> {}

impl Heap {
    /// A heap backed by the operating system.
    pub const fn new() -> Self {
        Self::with_observer(SystemPages, NoopObserver)
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PageSource> Heap<P> {
    pub const fn with_source(source: P) -> Self {
        Self::with_observer(source, NoopObserver)
    }
}

impl<P: PageSource, O: AllocObserver> Heap<P, O> {
    pub const fn with_observer(source: P, observer: O) -> Self {
        Self {
            table: [None; SIZE_CLASS_COUNT],
            source,
            observer,
        }
    }

    /// Allocates at least `size` bytes.
    ///
    /// Returns `Ok(None)` for a zero-sized request. Size-class blocks are
    /// aligned to their block size; large objects are page-aligned.
    ///
    /// # Errors
    /// `OutOfPages` if the page source cannot supply memory, `SizeOverflow` if
    /// `size` cannot be rounded up to whole pages.
    pub fn allocate(&mut self, size: usize) -> Result<Option<NonNull<u8>>, AllocError> {
        if size == 0 {
            return Ok(None);
        }
        match route(size).ok_or(AllocError::SizeOverflow { requested: size })? {
            SizeRoute::Class(index) => self.allocate_block(size, index).map(Some),
            SizeRoute::Large(pages) => self.allocate_large(size, pages).map(Some),
        }
    }

    fn allocate_block(&mut self, requested: usize, index: usize) -> Result<NonNull<u8>, AllocError> {
        loop {
            if let Some(page) = self.table[index] {
                if let Some(block) = unsafe { page.pop() } {
                    self.observer.on_allocate(requested, page.block_size(), block);
                    return Ok(block);
                }
            }
            let page = self.bootstrap_page(index)?;
            self.table[index] = Some(page);
        }
    }

    /// Maps a fresh page for class `index`, linked in front of the class's
    /// current page.
    fn bootstrap_page(&mut self, index: usize) -> Result<PageRef, AllocError> {
        let Some(base) = self.source.map_pages(1) else {
            self.observer.on_page_failure(1);
            return Err(AllocError::OutOfPages { pages: 1 });
        };
        let size = block_size(index);
        let (page, blocks) = unsafe { PageRef::bootstrap(base, size, self.table[index]) };
        self.observer.on_page_bootstrap(size, blocks, base);
        Ok(page)
    }

    fn allocate_large(&mut self, requested: usize, pages: usize) -> Result<NonNull<u8>, AllocError> {
        match self.source.map_pages(pages) {
            Some(ptr) => {
                self.observer.on_large(requested, pages, ptr);
                Ok(ptr)
            }
            None => {
                self.observer.on_page_failure(pages);
                Err(AllocError::OutOfPages { pages })
            }
        }
    }

    /// Returns a block to its page's freelist.
    ///
    /// Null is ignored. So is any pointer whose page carries no validity
    /// marker: large objects are never reclaimed through this call.
    ///
    /// # Safety
    /// `ptr` must be null, or point into a live allocation of this heap, or
    /// into readable memory whose enclosing page is not a size-class page.
    pub unsafe fn release(&mut self, ptr: *mut u8) {
        let Some(ptr) = NonNull::new(ptr) else {
            return;
        };
        match PageRef::classify(ptr) {
            Some(page) => {
                page.push(ptr);
                self.observer.on_release(ptr, page.block_size());
            }
            None => self.observer.on_ignored_release(ptr),
        }
    }

    /// Unmaps a large object whose original request size is known.
    ///
    /// Sizes at or below the large-object threshold are handed to `release`.
    ///
    /// # Safety
    /// `ptr` must have been returned by `allocate(size)` on this heap and not
    /// released since.
    pub unsafe fn release_large(&mut self, ptr: *mut u8, size: usize) {
        let Some(base) = NonNull::new(ptr) else {
            return;
        };
        if size <= LARGE_THRESHOLD {
            self.release(ptr);
            return;
        }
        if let Some(pages) = pages_for(size) {
            self.source.unmap_pages(base, pages);
        }
    }

    /// Bytes usable at `ptr` without touching a neighbouring allocation.
    ///
    /// 0 for null, the block size for size-class pointers, and one page for
    /// anything else. The last case is an approximation, not a measured size.
    ///
    /// # Safety
    /// Same as `release`.
    pub unsafe fn usable_size(&self, ptr: *const u8) -> usize {
        let Some(ptr) = NonNull::new(ptr.cast_mut()) else {
            return 0;
        };
        match PageRef::classify(ptr) {
            Some(page) => page.block_size(),
            None => PAGE_SIZE,
        }
    }

    /// The page allocations of class `index` are currently served from.
    #[cfg(test)]
    pub(crate) fn current_page(&self, index: usize) -> Option<PageRef> {
        self.table[index]
    }
}

impl<P: PageSource, O: AllocObserver> Drop for Heap<P, O> {
    fn drop(&mut self) {
        for slot in &mut self.table {
            let mut current = slot.take();
            while let Some(page) = current {
                current = page.prior();
                unsafe { self.source.unmap_pages(page.base(), 1) };
            }
        }
    }
}

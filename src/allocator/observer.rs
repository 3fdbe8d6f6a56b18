//! Diagnostic hooks for the allocation path.
//!
//! A `Heap` reports what it does to an `AllocObserver`. The default observer
//! discards everything; `TracingObserver` turns the events into `tracing`
//! records. Observers run inside the allocator, so an observer used by the
//! process-wide allocator must not allocate.

use core::ptr::NonNull;

/// Receives allocator events. Every method defaults to doing nothing.
pub trait AllocObserver {
    /// A size-classed block was handed out.
    fn on_allocate(&self, _requested: usize, _block_size: usize, _ptr: NonNull<u8>) {}

    /// A large object was mapped directly.
    fn on_large(&self, _requested: usize, _pages: usize, _ptr: NonNull<u8>) {}

    /// A block went back onto its page's freelist.
    fn on_release(&self, _ptr: NonNull<u8>, _block_size: usize) {}

    /// `release` was given a pointer without a recognisable page header.
    fn on_ignored_release(&self, _ptr: NonNull<u8>) {}

    /// A fresh page was carved into `blocks` blocks of `block_size`.
    fn on_page_bootstrap(&self, _block_size: usize, _blocks: usize, _page: NonNull<u8>) {}

    /// The page source refused to map `pages` pages.
    fn on_page_failure(&self, _pages: usize) {}
}

/// Discards every event.
#[derive(Default, Clone, Copy, Debug)]
pub struct NoopObserver;

impl AllocObserver for NoopObserver {}

/// Emits allocator events through `tracing`.
#[cfg(feature = "tracing")]
#[derive(Default, Clone, Copy, Debug)]
pub struct TracingObserver;

#[cfg(feature = "tracing")]
impl AllocObserver for TracingObserver {
    fn on_allocate(&self, requested: usize, block_size: usize, ptr: NonNull<u8>) {
        tracing::trace!(requested, block_size, ptr = ?ptr, "allocate");
    }

    fn on_large(&self, requested: usize, pages: usize, ptr: NonNull<u8>) {
        tracing::trace!(requested, pages, ptr = ?ptr, "allocate large");
    }

    fn on_release(&self, ptr: NonNull<u8>, block_size: usize) {
        tracing::trace!(ptr = ?ptr, block_size, "release");
    }

    fn on_ignored_release(&self, ptr: NonNull<u8>) {
        tracing::warn!(ptr = ?ptr, "release of unrecognised pointer ignored");
    }

    fn on_page_bootstrap(&self, block_size: usize, blocks: usize, page: NonNull<u8>) {
        tracing::debug!(block_size, blocks, page = ?page, "bootstrapped page");
    }

    fn on_page_failure(&self, pages: usize) {
        tracing::warn!(pages, "page source exhausted");
    }
}

impl<O: AllocObserver + ?Sized> AllocObserver for &O {
    fn on_allocate(&self, requested: usize, block_size: usize, ptr: NonNull<u8>) {
        (**self).on_allocate(requested, block_size, ptr);
    }

    fn on_large(&self, requested: usize, pages: usize, ptr: NonNull<u8>) {
        (**self).on_large(requested, pages, ptr);
    }

    fn on_release(&self, ptr: NonNull<u8>, block_size: usize) {
        (**self).on_release(ptr, block_size);
    }

    fn on_ignored_release(&self, ptr: NonNull<u8>) {
        (**self).on_ignored_release(ptr);
    }

    fn on_page_bootstrap(&self, block_size: usize, blocks: usize, page: NonNull<u8>) {
        (**self).on_page_bootstrap(block_size, blocks, page);
    }

    fn on_page_failure(&self, pages: usize) {
        (**self).on_page_failure(pages);
    }
}

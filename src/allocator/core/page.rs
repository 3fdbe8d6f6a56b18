//! Page headers and pointer classification.
//!
//! This is the only module that reinterprets raw page memory as a
//! `PageHeader`. Every path from an arbitrary pointer to a header goes through
//! `PageRef::classify`, which checks the validity marker first.

use super::freelist::Freelist;
use super::size_class::{align_down, align_up};
use crate::allocator::constants::{LARGE_THRESHOLD, MIN_BLOCK_SIZE, PAGE_MAGIC, PAGE_SIZE};
use core::mem::size_of;
use core::ptr::NonNull;

/// Metadata at offset 0 of every size-class page.
///
/// `magic` must stay the first field: classification reads it before it
/// knows whether the rest of the header exists.
#[repr(C)]
pub struct PageHeader {
    magic: u32,
    block_size: usize,
    free: Freelist,
    prior: Option<PageRef>,
}

/// Bytes at the start of a page taken by its header.
pub const HEADER_SIZE: usize = size_of::<PageHeader>();

/// Offset of the first block for a page of `block_size` blocks.
#[inline]
pub const fn first_block_offset(block_size: usize) -> usize {
    align_up(HEADER_SIZE, block_size)
}

/// Number of blocks a fresh page of `block_size` blocks is carved into.
#[inline]
pub const fn blocks_per_page(block_size: usize) -> usize {
    (PAGE_SIZE - first_block_offset(block_size)) / block_size
}

// The largest class still needs one block per page.
const _: () = assert!(blocks_per_page(LARGE_THRESHOLD) >= 1);

/// A handle to a live size-class page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRef(NonNull<PageHeader>);

impl PageRef {
    /// Writes a header into `page` and threads every block of the page onto
    /// its freelist. Returns the page and the number of blocks carved.
    ///
    /// Blocks are pushed in ascending address order, so the first allocation
    /// from the page gets its highest block.
    ///
    /// # Safety
    /// `page` must be a page-aligned, writable, `PAGE_SIZE` region owned by the
    /// caller. `block_size` must be a power of two in `16..=2048`.
    pub unsafe fn bootstrap(
        page: NonNull<u8>,
        block_size: usize,
        prior: Option<PageRef>,
    ) -> (Self, usize) {
        debug_assert!(block_size.is_power_of_two());
        debug_assert!((MIN_BLOCK_SIZE..=LARGE_THRESHOLD).contains(&block_size));
        debug_assert_eq!(page.as_ptr() as usize % PAGE_SIZE, 0);

        let header = page.cast::<PageHeader>();
        header.as_ptr().write(PageHeader {
            magic: PAGE_MAGIC,
            block_size,
            free: Freelist::new(),
            prior,
        });

        let free = &mut (*header.as_ptr()).free;
        let mut carved = 0;
        let mut offset = first_block_offset(block_size);
        while offset + block_size <= PAGE_SIZE {
            free.push(NonNull::new_unchecked(page.as_ptr().add(offset)));
            offset += block_size;
            carved += 1;
        }

        (Self(header), carved)
    }

    /// Recovers the page that owns `ptr`, if it is a size-class page.
    ///
    /// Returns `None` when the enclosing page does not carry the validity
    /// marker, which is the case for large objects and foreign memory.
    ///
    /// # Safety
    /// The page enclosing `ptr` must be mapped and readable.
    pub unsafe fn classify(ptr: NonNull<u8>) -> Option<Self> {
        let base = align_down(ptr.as_ptr() as usize, PAGE_SIZE);
        let header = base as *const PageHeader;
        let magic = core::ptr::addr_of!((*header).magic).read();
        if magic != PAGE_MAGIC {
            return None;
        }
        Some(Self(NonNull::new_unchecked(base as *mut PageHeader)))
    }

    /// Start address of the page.
    #[inline]
    pub fn base(self) -> NonNull<u8> {
        self.0.cast()
    }

    #[inline]
    pub fn block_size(self) -> usize {
        unsafe { (*self.0.as_ptr()).block_size }
    }

    /// The page bootstrapped for the same class just before this one.
    #[inline]
    pub fn prior(self) -> Option<PageRef> {
        unsafe { (*self.0.as_ptr()).prior }
    }

    #[inline]
    pub fn has_free(self) -> bool {
        unsafe { !(*self.0.as_ptr()).free.is_empty() }
    }

    /// Takes the head of the page's freelist.
    ///
    /// # Safety
    /// No released block of this page may have been written since its release.
    #[inline]
    pub unsafe fn pop(self) -> Option<NonNull<u8>> {
        (*self.0.as_ptr()).free.pop()
    }

    /// Returns the block containing `ptr` to this page's freelist.
    ///
    /// # Safety
    /// `ptr` must point into a block of this page that is currently allocated.
    #[inline]
    pub unsafe fn push(self, ptr: NonNull<u8>) {
        let block_size = self.block_size();
        let base = self.0.as_ptr() as usize;
        let offset = align_down(ptr.as_ptr() as usize - base, block_size);
        debug_assert!(offset >= first_block_offset(block_size));
        let block = (base + offset) as *mut u8;
        (*self.0.as_ptr()).free.push(NonNull::new_unchecked(block));
    }

    /// Number of blocks currently on this page's freelist.
    ///
    /// # Safety
    /// Same as `pop`.
    pub unsafe fn free_count(self) -> usize {
        (*self.0.as_ptr()).free.count()
    }
}

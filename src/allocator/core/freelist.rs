use core::ptr::NonNull;

/// The view of a free block: its first word links to the next free block.
#[repr(C)]
struct FreeNode {
    next: Option<NonNull<FreeNode>>,
}

/// An intrusive LIFO list of free blocks.
///
/// The list owns no memory of its own; each link is stored in the first word
/// of the block it describes. Blocks must be at least `size_of::<usize>()`
/// bytes and pointer-aligned.
#[repr(C)]
pub struct Freelist {
    head: Option<NonNull<FreeNode>>,
}

impl Freelist {
    pub const fn new() -> Self {
        Self { head: None }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Pushes a block onto the list.
    ///
    /// # Safety
    /// `block` must be valid for writes of a pointer, aligned, and not in use
    /// by anyone else (including already being on this or another list).
    #[inline]
    pub unsafe fn push(&mut self, block: NonNull<u8>) {
        let node = block.cast::<FreeNode>();
        node.as_ptr().write(FreeNode { next: self.head });
        self.head = Some(node);
    }

    /// Pops the most recently pushed block.
    ///
    /// # Safety
    /// Every block on the list must still be untouched since it was pushed.
    #[inline]
    pub unsafe fn pop(&mut self) -> Option<NonNull<u8>> {
        let node = self.head?;
        self.head = node.as_ptr().read().next;
        Some(node.cast())
    }

    /// Counts the blocks on the list by walking it.
    ///
    /// # Safety
    /// Same as `pop`.
    pub unsafe fn count(&self) -> usize {
        let mut count = 0;
        let mut current = self.head;
        while let Some(node) = current {
            count += 1;
            current = (*node.as_ptr()).next;
        }
        count
    }
}

impl Default for Freelist {
    fn default() -> Self {
        Self::new()
    }
}

//! The process-wide allocator.
//!
//! One `Heap` backed by the operating system is shared by the whole process
//! behind a spin lock. The lock is what makes `PageMalloc` usable as a
//! `#[global_allocator]`; the heap itself stays a single allocation stream.
//! It is a plain atomic flag rather than `std::sync::Mutex` because some
//! platforms' mutexes allocate on first use.
//!
//! Running out of pages, or re-entering the allocator from inside itself, is
//! fatal here: the emergency state is flagged, a diagnostic is written to
//! stderr without allocating, and the process aborts. While the emergency
//! state is set, allocations are served from a small static buffer so that
//! whatever runs during the shutdown can still allocate a little.

use super::constants::{EMERGENCY_BLOCK_SIZE, LARGE_THRESHOLD, PAGE_SIZE};
use super::core::Heap;
use super::error::AllocError;
use super::syscall::write_stderr;
use core::alloc::{GlobalAlloc, Layout};
use core::cell::{Cell, UnsafeCell};
use core::ptr;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use crossbeam_utils::Backoff;

thread_local! {
    static IN_ALLOCATOR: Cell<bool> = const { Cell::new(false) };
}

static HEAP: GlobalHeap = GlobalHeap::new();

static EMERGENCY: EmergencyBlock = EmergencyBlock::new();

struct GlobalHeap {
    locked: AtomicBool,
    heap: UnsafeCell<Heap>,
}

unsafe impl Sync for GlobalHeap {}

impl GlobalHeap {
    const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
            heap: UnsafeCell::new(Heap::new()),
        }
    }

    fn lock(&self) -> HeapGuard<'_> {
        let backoff = Backoff::new();
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff.snooze();
        }
        HeapGuard { owner: self }
    }
}

struct HeapGuard<'a> {
    owner: &'a GlobalHeap,
}

impl Deref for HeapGuard<'_> {
    type Target = Heap;

    fn deref(&self) -> &Heap {
        unsafe { &*self.owner.heap.get() }
    }
}

impl DerefMut for HeapGuard<'_> {
    fn deref_mut(&mut self) -> &mut Heap {
        unsafe { &mut *self.owner.heap.get() }
    }
}

impl Drop for HeapGuard<'_> {
    fn drop(&mut self) {
        self.owner.locked.store(false, Ordering::Release);
    }
}

struct ReentrancyGuard;

impl ReentrancyGuard {
    /// Marks this thread as inside the allocator.
    /// Returns None if it already was.
    fn try_enter() -> Option<Self> {
        // TLS can be gone during thread teardown; there is nothing to guard
        // against then, so carry on unguarded.
        match IN_ALLOCATOR.try_with(|f| f.replace(true)) {
            Ok(true) => None,
            _ => Some(Self),
        }
    }

    fn enter() -> Self {
        match Self::try_enter() {
            Some(guard) => guard,
            None => fatal(b"segalloc: nested call into the allocator, aborting\n"),
        }
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        let _ = IN_ALLOCATOR.try_with(|f| f.set(false));
    }
}

/// A fixed buffer for allocations made after a fatal error was flagged.
#[repr(C, align(16))]
struct EmergencyBlock {
    bytes: UnsafeCell<[u8; EMERGENCY_BLOCK_SIZE]>,
    cursor: AtomicUsize,
    active: AtomicBool,
}

unsafe impl Sync for EmergencyBlock {}

impl EmergencyBlock {
    const fn new() -> Self {
        Self {
            bytes: UnsafeCell::new([0; EMERGENCY_BLOCK_SIZE]),
            cursor: AtomicUsize::new(0),
            active: AtomicBool::new(false),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    fn base(&self) -> usize {
        self.bytes.get() as usize
    }

    fn contains(&self, ptr: *const u8) -> bool {
        let addr = ptr as usize;
        addr >= self.base() && addr < self.base() + EMERGENCY_BLOCK_SIZE
    }

    /// Bumps `size` bytes aligned to `align` off the buffer; null once it is used up.
    fn allocate(&self, size: usize, align: usize) -> *mut u8 {
        let base = self.base();
        let mut cursor = self.cursor.load(Ordering::Relaxed);
        loop {
            let start = (base + cursor + align - 1) & !(align - 1);
            let end = match start.checked_add(size) {
                Some(end) if end <= base + EMERGENCY_BLOCK_SIZE => end,
                _ => return ptr::null_mut(),
            };
            match self.cursor.compare_exchange_weak(
                cursor,
                end - base,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return start as *mut u8,
                Err(actual) => cursor = actual,
            }
        }
    }
}

/// Flags the emergency state, reports `msg` and aborts.
fn fatal(msg: &[u8]) -> ! {
    EMERGENCY.activate();
    write_stderr(msg);
    std::process::abort()
}

fn out_of_memory(err: AllocError) -> ! {
    match err {
        AllocError::OutOfPages { .. } => {
            fatal(b"segalloc: could not map memory from the operating system, aborting\n")
        }
        AllocError::SizeOverflow { .. } => {
            fatal(b"segalloc: allocation size overflows the address space, aborting\n")
        }
    }
}

/// Allocates `size` bytes from the process-wide heap.
///
/// Returns null only for `size == 0` (or once the emergency buffer is used up).
/// Aborts the process if the operating system refuses to map memory.
pub fn malloc(size: usize) -> *mut u8 {
    allocate(size, 1)
}

fn allocate(size: usize, align: usize) -> *mut u8 {
    if EMERGENCY.is_active() {
        return EMERGENCY.allocate(size, align);
    }
    let _guard = ReentrancyGuard::enter();
    let result = HEAP.lock().allocate(size);
    match result {
        Ok(Some(ptr)) => ptr.as_ptr(),
        Ok(None) => ptr::null_mut(),
        Err(err) => out_of_memory(err),
    }
}

/// Returns a block to the process-wide heap.
///
/// Null, emergency-buffer pointers and large objects are ignored.
///
/// # Safety
/// `ptr` must be null or a pointer returned by `malloc` that has not been freed.
pub unsafe fn free(ptr: *mut u8) {
    if ptr.is_null() || EMERGENCY.contains(ptr) {
        return;
    }
    let _guard = ReentrancyGuard::enter();
    HEAP.lock().release(ptr);
}

/// Usable bytes behind a pointer returned by `malloc`.
///
/// 0 for null and for emergency-buffer pointers; one page for large objects.
///
/// # Safety
/// Same as `free`.
pub unsafe fn usable_size(ptr: *const u8) -> usize {
    if ptr.is_null() || EMERGENCY.contains(ptr) {
        return 0;
    }
    let _guard = ReentrancyGuard::enter();
    HEAP.lock().usable_size(ptr)
}

/// A `GlobalAlloc` over the process-wide heap.
///
/// ```rust,ignore
/// #[global_allocator]
/// static GLOBAL: segalloc::PageMalloc = segalloc::PageMalloc;
/// ```
///
/// Alignments above one page are not supported and yield null. Large objects
/// are leaked on `dealloc` unless the `reclaim-large` feature is enabled, in
/// which case their pages are unmapped using the size from the layout.
#[derive(Default, Clone, Copy, Debug)]
pub struct PageMalloc;

impl PageMalloc {
    /// Usable bytes behind `ptr`; see `usable_size`.
    ///
    /// # Safety
    /// `ptr` must be null or currently allocated by this allocator.
    pub unsafe fn usable_size(&self, ptr: *const u8) -> usize {
        usable_size(ptr)
    }
}

unsafe impl GlobalAlloc for PageMalloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > PAGE_SIZE {
            return ptr::null_mut();
        }
        // Blocks are aligned to their size, so padding the size covers the alignment.
        let size = layout.size().max(layout.align());
        allocate(size, layout.align())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if ptr.is_null() || EMERGENCY.contains(ptr) {
            return;
        }
        let size = layout.size().max(layout.align());
        if size <= LARGE_THRESHOLD {
            free(ptr);
            return;
        }
        // Never classify a large object: its first bytes are caller data.
        #[cfg(feature = "reclaim-large")]
        {
            let _guard = ReentrancyGuard::enter();
            HEAP.lock().release_large(ptr, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::{Command, Output};

    // Set in a re-run of this test binary; the child takes the fatal branch.
    const FATAL_CHILD_ENV: &str = "SEGALLOC_FATAL_CHILD";

    fn in_child() -> bool {
        std::env::var_os(FATAL_CHILD_ENV).is_some()
    }

    /// Re-runs exactly `test` of this binary in a child process.
    fn run_in_child(test: &str) -> Output {
        let exe = std::env::current_exe().unwrap();
        Command::new(exe)
            .args([test, "--exact", "--nocapture", "--test-threads=1"])
            .env(FATAL_CHILD_ENV, "1")
            .output()
            .unwrap()
    }

    #[test]
    fn test_reentrancy_guard_detects_nesting() {
        let outer = ReentrancyGuard::try_enter();
        assert!(outer.is_some());
        assert!(ReentrancyGuard::try_enter().is_none());
        drop(outer);
        let again = ReentrancyGuard::try_enter();
        assert!(again.is_some());
    }

    #[test]
    fn test_emergency_block_bumps_until_full() {
        let block = EmergencyBlock::new();
        assert!(!block.is_active());
        block.activate();
        assert!(block.is_active());

        let a = block.allocate(10, 1);
        let b = block.allocate(16, 16);
        assert!(!a.is_null() && !b.is_null());
        assert!(block.contains(a) && block.contains(b));
        assert_eq!(b as usize % 16, 0);
        assert!(b as usize >= a as usize + 10);

        assert!(block.allocate(EMERGENCY_BLOCK_SIZE, 1).is_null());
        let mut last = ptr::null_mut();
        loop {
            let p = block.allocate(64, 8);
            if p.is_null() {
                break;
            }
            last = p;
        }
        assert!(block.contains(last));
    }

    #[test]
    fn test_process_heap_round_trip() {
        let p = malloc(24);
        assert!(!p.is_null());
        unsafe {
            assert_eq!(usable_size(p), 32);
            free(p);
        }
        assert!(malloc(0).is_null());
        unsafe {
            free(ptr::null_mut());
            assert_eq!(usable_size(ptr::null()), 0);
        }
    }

    #[test]
    fn test_nested_entry_aborts_with_diagnostic() {
        if in_child() {
            let _outer = ReentrancyGuard::enter();
            let _inner = ReentrancyGuard::enter();
            return;
        }
        let out = run_in_child("allocator::global::tests::test_nested_entry_aborts_with_diagnostic");
        assert!(!out.status.success());
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("nested call into the allocator"), "{stderr}");
    }

    #[test]
    fn test_unmappable_request_aborts_with_diagnostic() {
        if in_child() {
            malloc(usize::MAX);
            return;
        }
        let out =
            run_in_child("allocator::global::tests::test_unmappable_request_aborts_with_diagnostic");
        assert!(!out.status.success());
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("overflows the address space"), "{stderr}");
    }

    #[test]
    fn test_emergency_state_serves_from_static_buffer() {
        if in_child() {
            EMERGENCY.activate();

            let p = malloc(24);
            assert!(!p.is_null());
            assert!(EMERGENCY.contains(p));
            unsafe {
                assert_eq!(usable_size(p), 0);
                free(p);
            }

            let layout = Layout::from_size_align(40, 16).unwrap();
            let q = unsafe { PageMalloc.alloc(layout) };
            assert!(EMERGENCY.contains(q));
            assert_eq!(q as usize % 16, 0);
            assert!(q as usize >= p as usize + 24);
            unsafe { PageMalloc.dealloc(q, layout) };

            assert!(malloc(EMERGENCY_BLOCK_SIZE).is_null());
            return;
        }
        let out =
            run_in_child("allocator::global::tests::test_emergency_state_serves_from_static_buffer");
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(out.status.success(), "{stdout}");
        assert!(stdout.contains("1 passed"), "{stdout}");
    }
}

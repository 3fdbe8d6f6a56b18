#![cfg(windows)]

use core::ptr::{self, NonNull};
use windows_sys::Win32::System::Console::{GetStdHandle, STD_ERROR_HANDLE};
use windows_sys::Win32::Storage::FileSystem::WriteFile;
use windows_sys::Win32::System::Memory::{
    VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
};

/// # Safety
/// `size` must be a non-zero multiple of the page size.
pub unsafe fn map_region(size: usize) -> Option<NonNull<u8>> {
    let ptr = VirtualAlloc(ptr::null(), size, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE);
    NonNull::new(ptr.cast::<u8>())
}

/// # Safety
/// `ptr` must be the base of a region returned by `map_region`.
pub unsafe fn unmap_region(ptr: NonNull<u8>, _size: usize) {
    // MEM_RELEASE frees the entire region reserved by VirtualAlloc. Size must be 0.
    VirtualFree(ptr.as_ptr().cast(), 0, MEM_RELEASE);
}

pub fn write_stderr(msg: &[u8]) {
    unsafe {
        let handle = GetStdHandle(STD_ERROR_HANDLE);
        let mut written = 0;
        WriteFile(handle, msg.as_ptr(), msg.len() as u32, &mut written, ptr::null_mut());
    }
}

//! Allocates an integer through the process-wide heap, prints it and frees it.

use segalloc::allocator::global::{free, malloc, usable_size};

fn main() {
    let p = malloc(core::mem::size_of::<i32>()).cast::<i32>();
    assert!(!p.is_null());
    unsafe {
        p.write(6);
        println!("value: {}", p.read());
        println!("usable size: {}", usable_size(p.cast()));
        free(p.cast());
    }
}

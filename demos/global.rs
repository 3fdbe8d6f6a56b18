use segalloc::PageMalloc;
use std::collections::HashMap;

#[global_allocator]
static ALLOC: PageMalloc = PageMalloc;

fn main() {
    let mut v = Vec::new();
    for i in 0..100_000u32 {
        v.push(i);
    }
    println!("vec with {} elements", v.len());

    let words: HashMap<String, usize> = (0..1_000).map(|i| (format!("key-{i}"), i)).collect();
    println!("map with {} entries", words.len());

    let boxed = Box::new([0u8; 40]);
    println!("40-byte box sits in a {}-byte block", unsafe {
        ALLOC.usable_size(boxed.as_ptr())
    });
}

pub mod freelist;
pub mod heap;
pub mod page;
pub mod size_class;


pub use heap::Heap;
pub use page::{blocks_per_page, first_block_offset, PageRef, HEADER_SIZE};
pub use size_class::{block_size, class_index, pages_for, route, SizeRoute};

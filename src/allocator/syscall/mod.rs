//! Raw virtual-memory mapping for the platform. Everything here is the black-box
//! page primitive; no allocator bookkeeping happens at this level.

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{map_region, unmap_region, write_stderr};

#[cfg(windows)]
pub use windows::{map_region, unmap_region, write_stderr};

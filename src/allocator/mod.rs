//! A segregated size-class allocator over page-granularity virtual memory.

pub mod bootstrap;
pub mod constants;
pub mod core;
pub mod error;
#[cfg(feature = "c-abi")]
pub mod ffi;
pub mod global;
pub mod observer;
pub mod source;
pub mod syscall;

pub use self::bootstrap::ReservedArena;
pub use self::core::Heap;
pub use self::error::AllocError;
pub use self::global::PageMalloc;
#[cfg(feature = "tracing")]
pub use self::observer::TracingObserver;
pub use self::observer::{AllocObserver, NoopObserver};
pub use self::source::{PageSource, SystemPages};

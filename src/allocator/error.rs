use core::fmt;

/// The error type for allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The page source could not supply `pages` contiguous pages.
    OutOfPages {
        /// Number of pages that were requested.
        pages: usize,
    },
    /// Rounding `requested` up to whole pages overflows `usize`.
    SizeOverflow {
        /// The size passed to the allocator.
        requested: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfPages { pages } => {
                write!(f, "page source could not map {pages} page(s)")
            }
            Self::SizeOverflow { requested } => {
                write!(f, "allocation of {requested} bytes overflows page rounding")
            }
        }
    }
}

impl std::error::Error for AllocError {}

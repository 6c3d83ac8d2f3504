//! Error types for safelibs.

use thiserror::Error;

/// Result type alias using safelibs' Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure conditions reported by the hardened primitives.
///
/// Precondition violations (short buffers handed to the raw entry points) are
/// undefined behaviour and never surface here. Truncation is not an error.
#[derive(Error, Debug)]
pub enum Error {
    /// The virtual memory mapping could not be created, or the requested
    /// size does not fit in the address space.
    #[error("out of memory: cannot map {0} bytes")]
    OutOfMemory(usize),

    /// Alignment is not a power of two or exceeds the page size.
    #[error("invalid alignment {0}")]
    InvalidAlignment(usize),

    /// The allocation header no longer matches what was written at
    /// allocation time. The block has been released regardless.
    #[error("heap corruption detected at {addr:#x}")]
    Corruption { addr: usize },

    /// No supported OS interface exists for this operation on this target.
    #[error("operation not supported on this platform")]
    Unsupported,

    /// The operating system rejected the request.
    #[error("system error: {0}")]
    Os(#[from] std::io::Error),
}

impl Error {
    /// The `errno` value the C ABI reports for this error.
    pub fn errno(&self) -> libc::c_int {
        match self {
            Error::OutOfMemory(_) => libc::ENOMEM,
            Error::InvalidAlignment(_) | Error::Corruption { .. } => libc::EINVAL,
            Error::Unsupported => libc::ENOSYS,
            Error::Os(e) => e.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

use thiserror::Error;

/// Error types for ring operations.
///
/// `WouldBlock` is the only error expected during normal operation; the
/// `Invalid*` variants signal caller bugs and `OutOfMemory` an allocator
/// failure at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// The requested slot count is not a power of two in `2..=2^31`.
    #[error("slot count must be a power of two between 2 and 2^31, got {0}")]
    InvalidCapacity(u32),

    /// The element type is zero-sized.
    #[error("zero-sized element types are not supported")]
    InvalidElementSize,

    /// An empty slice (or one longer than `u32::MAX`) was passed to a
    /// transfer operation.
    #[error("transfer length must be between 1 and u32::MAX elements")]
    InvalidLength,

    /// The slot array could not be allocated.
    #[error("failed to allocate {bytes} bytes of slot storage")]
    OutOfMemory {
        /// Size of the attempted allocation.
        bytes: usize,
    },

    /// The ring is too full to push or too empty to pop. Expected under
    /// backpressure; retry after the opposite role makes progress.
    #[error("operation would block ({available} slots available)")]
    WouldBlock {
        /// Free slots observed by a failed push, ready elements observed
        /// by a failed pop. Advisory; may be stale on return.
        available: u32,
    },
}

impl RingError {
    /// Returns `true` for the backpressure outcome that a caller should
    /// retry rather than treat as a bug.
    #[inline]
    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::WouldBlock { .. })
    }

    /// Returns `true` if this error reports invalid caller input.
    #[inline]
    pub fn is_invalid(&self) -> bool {
        matches!(
            self,
            Self::InvalidCapacity(_) | Self::InvalidElementSize | Self::InvalidLength
        )
    }
}

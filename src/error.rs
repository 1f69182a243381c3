/// Failures reported by [`SlotAllocator::allocate`](crate::SlotAllocator::allocate).
///
/// A failed allocation never mutates allocator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The requested run is longer than a chunk, so no chunk could ever satisfy it.
    #[error("requested {requested} slots but a chunk holds only {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    /// A fixed allocator has no chunk with a long enough free run.
    #[error("no free run of {requested} slots in any chunk")]
    OutOfMemory { requested: usize },
    /// Reserving memory for a new chunk (or heap block) failed.
    #[error("system memory reservation failed")]
    SystemOutOfMemory,
    #[error("cannot allocate a run of zero slots")]
    ZeroCount,
}

pub type Result<T> = std::result::Result<T, Error>;

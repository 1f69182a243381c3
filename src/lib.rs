//! Pool allocators that hand out contiguous runs of same-sized slots.
//!
//! An [`Allocator<T, N>`] reserves memory in chunks of `N` slots, tracking each slot as
//! [`SlotState::Free`] or [`SlotState::Allocated`]. Requests are served first fit, newest chunk
//! first. A fixed allocator stops at one chunk; a [`GrowableAllocator`] adds chunks on demand.
//!
//! Containers are written against [`SlotAllocator`], which [`HeapAllocator`] also implements:
//!
//! ```
//! use chunk_pool::{Allocator, GrowableAllocator, SList};
//!
//! let mut fixed = SList::<i32, Allocator<i32, 3>>::new();
//! for i in 0..3 {
//!     fixed.push_back(i)?;
//! }
//! assert!(fixed.push_back(3).is_err());
//!
//! let mut growable = SList::<i32, GrowableAllocator<i32, 3>>::new();
//! for i in 0..4 {
//!     growable.push_back(i)?;
//! }
//! assert!(growable.iter().copied().eq(0..4));
//! # Ok::<(), chunk_pool::Error>(())
//! ```
#![warn(clippy::pedantic)]

mod chunk;
pub use chunk::SlotState;

mod error;
pub use error::*;

mod heap;
pub use heap::*;

pub mod list;
pub use list::SList;

mod pool;
pub use pool::*;

mod traits;
pub use traits::*;

pub mod vec;
pub use vec::SlotVec;

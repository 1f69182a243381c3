use std::fmt::Debug;

use crate::Result;

/// What a container needs from an allocator.
///
/// Allocations are identified by a `Handle` rather than a raw pointer. A handle is only meaningful
/// to the allocator instance that produced it.
///
/// Cloning an allocator yields a fresh allocator with the same configuration; it never shares the
/// original's memory.
pub trait SlotAllocator: Clone {
    type Value;
    type Handle: Copy + Eq + Debug;
    /// This allocator reconfigured for another element type. Handles keep the same type so that a
    /// value stored through the rebound allocator can refer to its neighbours.
    type Rebound<U>: SlotAllocator<Value = U, Handle = Self::Handle>;

    /// Reserves `count` contiguous slots, returning a handle to the first.
    ///
    /// # Errors
    ///
    /// When `count` is zero or no run of `count` slots can be provided. On error nothing is
    /// reserved.
    fn allocate(&mut self, count: usize) -> Result<Self::Handle>;

    /// Releases a run previously returned by [`SlotAllocator::allocate`].
    ///
    /// `handle` and `count` must match the original allocation exactly. Values still living in the
    /// run are not dropped.
    ///
    /// # Panics
    ///
    /// May panic when `handle` was not produced by this allocator.
    fn deallocate(&mut self, handle: Self::Handle, count: usize);

    /// The handle `index` slots after `handle` within the same run.
    fn advance(&self, handle: Self::Handle, index: usize) -> Self::Handle;

    /// Writes `value` into a reserved slot. Does not drop whatever the slot held before.
    ///
    /// # Safety
    ///
    /// `handle` must lie inside a run allocated from this allocator and not yet deallocated.
    unsafe fn construct(&mut self, handle: Self::Handle, value: Self::Value) -> &mut Self::Value;

    /// Drops the value in a slot, leaving the slot reserved.
    ///
    /// # Safety
    ///
    /// The slot must hold a value written by [`SlotAllocator::construct`] and not yet destroyed or
    /// taken.
    unsafe fn destroy(&mut self, handle: Self::Handle) {
        drop(self.take(handle));
    }

    /// Moves the value out of a slot, leaving the slot reserved.
    ///
    /// # Safety
    ///
    /// Same as [`SlotAllocator::destroy`].
    unsafe fn take(&mut self, handle: Self::Handle) -> Self::Value;

    /// # Safety
    ///
    /// Same as [`SlotAllocator::destroy`].
    unsafe fn get(&self, handle: Self::Handle) -> &Self::Value;

    /// # Safety
    ///
    /// Same as [`SlotAllocator::destroy`].
    unsafe fn get_mut(&mut self, handle: Self::Handle) -> &mut Self::Value;

    /// A fresh allocator for `U` with this allocator's configuration.
    fn rebind<U>(&self) -> Self::Rebound<U>;

    /// Largest run a single allocation can return.
    fn max_size(&self) -> usize;
}

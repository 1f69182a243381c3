use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ptr::NonNull;

use crate::{Error, Result, SlotAllocator};

/// A run of `T` slots obtained from the global allocator.
///
/// Stores the start of the run plus an index into it so that advancing a handle never does
/// pointer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapSlot {
    base: NonNull<u8>,
    index: usize,
}

/// [`SlotAllocator`] backed by the global allocator.
///
/// Every allocation is a separate heap block, so it never runs out short of system memory.
pub struct HeapAllocator<T> {
    __marker: PhantomData<fn() -> T>,
}

impl<T> HeapAllocator<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            __marker: PhantomData,
        }
    }

    fn ptr(handle: HeapSlot) -> *mut T {
        handle.base.as_ptr().cast::<T>().wrapping_add(handle.index)
    }
}

impl<T> SlotAllocator for HeapAllocator<T> {
    type Value = T;
    type Handle = HeapSlot;
    type Rebound<U> = HeapAllocator<U>;

    fn allocate(&mut self, count: usize) -> Result<HeapSlot> {
        #[cfg(feature = "log")]
        log::trace!("HeapAllocator::allocate({count})");

        if count == 0 {
            return Err(Error::ZeroCount);
        }
        let layout = Layout::array::<T>(count).map_err(|_| Error::CapacityExceeded {
            requested: count,
            capacity: self.max_size(),
        })?;
        let base = if layout.size() == 0 {
            NonNull::<T>::dangling().cast()
        } else {
            let ptr = unsafe { alloc::alloc(layout) };
            NonNull::new(ptr).ok_or(Error::SystemOutOfMemory)?
        };
        Ok(HeapSlot { base, index: 0 })
    }

    fn deallocate(&mut self, handle: HeapSlot, count: usize) {
        #[cfg(feature = "log")]
        log::trace!("HeapAllocator::deallocate({handle:?}, {count})");

        assert_eq!(handle.index, 0, "{handle:?} is not the start of a run");
        let Ok(layout) = Layout::array::<T>(count) else {
            panic!("run of {count} was never allocated");
        };
        if layout.size() != 0 {
            unsafe { alloc::dealloc(handle.base.as_ptr(), layout) };
        }
    }

    fn advance(&self, handle: HeapSlot, index: usize) -> HeapSlot {
        HeapSlot {
            base: handle.base,
            index: handle.index + index,
        }
    }

    unsafe fn construct(&mut self, handle: HeapSlot, value: T) -> &mut T {
        let ptr = Self::ptr(handle);
        ptr.write(value);
        &mut *ptr
    }

    unsafe fn destroy(&mut self, handle: HeapSlot) {
        Self::ptr(handle).drop_in_place();
    }

    unsafe fn take(&mut self, handle: HeapSlot) -> T {
        Self::ptr(handle).read()
    }

    unsafe fn get(&self, handle: HeapSlot) -> &T {
        &*Self::ptr(handle)
    }

    unsafe fn get_mut(&mut self, handle: HeapSlot) -> &mut T {
        &mut *Self::ptr(handle)
    }

    fn rebind<U>(&self) -> HeapAllocator<U> {
        HeapAllocator::new()
    }

    fn max_size(&self) -> usize {
        match size_of::<T>() {
            0 => usize::MAX,
            size => isize::MAX as usize / size,
        }
    }
}

impl<T> Default for HeapAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> Clone for HeapAllocator<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}
impl<T> PartialEq for HeapAllocator<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
impl<T> Eq for HeapAllocator<T> {}

impl<T> fmt::Debug for HeapAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HeapAllocator")
    }
}

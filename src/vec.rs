use std::fmt;
use std::iter::FusedIterator;
use std::ops::Range;

use crate::{HeapAllocator, Result, SlotAllocator};

/// Growable array storing its items in one contiguous run from a [`SlotAllocator`].
///
/// Capacity doubles (1, 2, 4, ...) when full: a new run is allocated, the items are moved across,
/// and only then is the old run released. On a fixed [`Allocator`](crate::Allocator) this
/// means the array can hold at most the largest power of two not above `N`.
pub struct SlotVec<T, A: SlotAllocator<Value = T> = HeapAllocator<T>> {
    alloc: A,
    buf: Option<A::Handle>,
    cap: usize,
    len: usize,
}

impl<T, A: SlotAllocator<Value = T> + Default> SlotVec<T, A> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(A::default())
    }
}

impl<T, A: SlotAllocator<Value = T>> SlotVec<T, A> {
    #[must_use]
    pub fn with_allocator(alloc: A) -> Self {
        Self {
            alloc,
            buf: None,
            cap: 0,
            len: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Appends `value`, growing the backing run when it is full.
    ///
    /// # Errors
    ///
    /// When the larger run cannot be allocated; `value` is dropped and the array is unchanged.
    pub fn push(&mut self, value: T) -> Result<()> {
        let buf = match self.buf {
            Some(buf) if self.len < self.cap => buf,
            _ => self.grow()?,
        };
        let slot = self.alloc.advance(buf, self.len);
        unsafe { self.alloc.construct(slot, value) };
        self.len += 1;
        Ok(())
    }

    /// Moves the items into a run twice as long, returning the new run.
    fn grow(&mut self) -> Result<A::Handle> {
        let cap = if self.cap == 0 { 1 } else { self.cap * 2 };
        let new = self.alloc.allocate(cap)?;

        #[cfg(feature = "log")]
        log::trace!("SlotVec::grow({} -> {cap})", self.cap);

        if let Some(old) = self.buf {
            for i in 0..self.len {
                let from = self.alloc.advance(old, i);
                let to = self.alloc.advance(new, i);
                unsafe {
                    let value = self.alloc.take(from);
                    self.alloc.construct(to, value);
                }
            }
            self.alloc.deallocate(old, self.cap);
        }
        self.buf = Some(new);
        self.cap = cap;
        Ok(new)
    }

    pub fn pop(&mut self) -> Option<T> {
        let buf = self.buf?;
        self.len = self.len.checked_sub(1)?;
        let slot = self.alloc.advance(buf, self.len);
        Some(unsafe { self.alloc.take(slot) })
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let buf = self.buf.filter(|_| index < self.len)?;
        Some(unsafe { self.alloc.get(self.alloc.advance(buf, index)) })
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let buf = self.buf.filter(|_| index < self.len)?;
        let slot = self.alloc.advance(buf, index);
        Some(unsafe { self.alloc.get_mut(slot) })
    }

    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter {
            vec: self,
            range: 0..self.len,
        }
    }
}

impl<T, A: SlotAllocator<Value = T>> Drop for SlotVec<T, A> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
        if let Some(buf) = self.buf.take() {
            self.alloc.deallocate(buf, self.cap);
        }
    }
}

impl<T, A: SlotAllocator<Value = T> + Default> Default for SlotVec<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, A: SlotAllocator<Value = T>> fmt::Debug for SlotVec<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over a [`SlotVec`].
pub struct Iter<'a, T, A: SlotAllocator<Value = T>> {
    vec: &'a SlotVec<T, A>,
    range: Range<usize>,
}

impl<'a, T, A: SlotAllocator<Value = T>> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let vec = self.vec;
        vec.get(self.range.next()?)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}
impl<T, A: SlotAllocator<Value = T>> ExactSizeIterator for Iter<'_, T, A> {}
impl<T, A: SlotAllocator<Value = T>> FusedIterator for Iter<'_, T, A> {}

impl<'a, T, A: SlotAllocator<Value = T>> IntoIterator for &'a SlotVec<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Iter<'a, T, A> {
        self.iter()
    }
}

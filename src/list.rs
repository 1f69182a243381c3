use std::fmt;
use std::iter::FusedIterator;

use crate::{HeapAllocator, Result, SlotAllocator};

/// List element as stored by the allocator: the value and the handle of its successor.
pub struct Node<T, H> {
    value: T,
    next: Option<H>,
}

/// The list's allocator `A` rebound to its node type.
pub type NodeAllocator<T, A> =
    <A as SlotAllocator>::Rebound<Node<T, <A as SlotAllocator>::Handle>>;

/// Append-only singly-linked list whose nodes come from a [`SlotAllocator`].
///
/// `A` is an allocator for `T`; the list rebinds it to allocate whole nodes, one slot each. With a
/// fixed [`Allocator`](crate::Allocator) of capacity `N` the list holds at most `N` items.
pub struct SList<T, A: SlotAllocator = HeapAllocator<T>> {
    alloc: NodeAllocator<T, A>,
    head: Option<A::Handle>,
    tail: Option<A::Handle>,
    len: usize,
}

impl<T, A: SlotAllocator + Default> SList<T, A> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(&A::default())
    }

    /// Drains `other` into a new list, reallocating every node from this list's allocator.
    ///
    /// Unlike a move, this works between lists with different allocators.
    ///
    /// # Errors
    ///
    /// When this list's allocator runs out; the items not yet moved are dropped.
    pub fn from_list<B: SlotAllocator>(other: SList<T, B>) -> Result<Self> {
        let mut list = Self::new();
        for value in other {
            list.push_back(value)?;
        }
        Ok(list)
    }
}

impl<T, A: SlotAllocator> SList<T, A> {
    /// An empty list allocating from a fresh allocator with `alloc`'s configuration.
    #[must_use]
    pub fn with_allocator(alloc: &A) -> Self {
        Self {
            alloc: alloc.rebind(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn allocator(&self) -> &NodeAllocator<T, A> {
        &self.alloc
    }

    /// Appends `value` to the end of the list.
    ///
    /// # Errors
    ///
    /// When the allocator cannot provide a slot for the node; `value` is dropped and the list is
    /// unchanged.
    pub fn push_back(&mut self, value: T) -> Result<()> {
        let handle = self.alloc.allocate(1)?;
        unsafe { self.alloc.construct(handle, Node { value, next: None }) };
        match self.tail {
            Some(tail) => {
                let tail = unsafe { self.alloc.get_mut(tail) };
                tail.next = Some(handle);
            }
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        self.len += 1;
        Ok(())
    }

    /// Removes the first item, returning its slot to the allocator.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        let node = unsafe { self.alloc.take(head) };
        self.alloc.deallocate(head, 1);

        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        Some(node.value)
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.head
            .map(|head| unsafe { &self.alloc.get(head).value })
    }

    /// Iterates from head to tail.
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter {
            list: self,
            next: self.head,
            remaining: self.len,
        }
    }

    /// Copies every item into a new list with a fresh allocator of the same configuration.
    ///
    /// # Errors
    ///
    /// When the new allocator runs out of memory.
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
    {
        let mut list = Self {
            alloc: self.alloc.clone(),
            head: None,
            tail: None,
            len: 0,
        };
        for value in self {
            list.push_back(value.clone())?;
        }
        Ok(list)
    }
}

impl<T, A: SlotAllocator> Drop for SList<T, A> {
    fn drop(&mut self) {
        #[cfg(feature = "log")]
        log::trace!("SList::drop({} items)", self.len);

        while self.pop_front().is_some() {}
    }
}

impl<T, A: SlotAllocator + Default> Default for SList<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy.
///
/// # Panics
///
/// When the copy cannot be allocated, see [`SList::try_clone`].
impl<T: Clone, A: SlotAllocator> Clone for SList<T, A> {
    fn clone(&self) -> Self {
        self.try_clone()
            .unwrap_or_else(|err| panic!("failed to clone list: {err}"))
    }
}

impl<T: fmt::Debug, A: SlotAllocator> fmt::Debug for SList<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

impl<T: PartialEq, A: SlotAllocator, B: SlotAllocator> PartialEq<SList<T, B>> for SList<T, A> {
    fn eq(&self, other: &SList<T, B>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

/// Borrowing iterator over an [`SList`], head to tail.
pub struct Iter<'a, T, A: SlotAllocator> {
    list: &'a SList<T, A>,
    next: Option<A::Handle>,
    remaining: usize,
}

impl<'a, T, A: SlotAllocator> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let handle = self.next?;
        let list = self.list;
        let node = unsafe { list.alloc.get(handle) };
        self.next = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
impl<T, A: SlotAllocator> ExactSizeIterator for Iter<'_, T, A> {}
impl<T, A: SlotAllocator> FusedIterator for Iter<'_, T, A> {}

impl<T, A: SlotAllocator> Clone for Iter<'_, T, A> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, T, A: SlotAllocator> IntoIterator for &'a SList<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Iter<'a, T, A> {
        self.iter()
    }
}

/// Owning iterator over an [`SList`], releasing each node as it is yielded.
pub struct IntoIter<T, A: SlotAllocator>(SList<T, A>);

impl<T, A: SlotAllocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len, Some(self.0.len))
    }
}
impl<T, A: SlotAllocator> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: SlotAllocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: SlotAllocator> IntoIterator for SList<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter(self)
    }
}

use std::mem::MaybeUninit;

use crate::{Error, Result};

/// Liveness of a single slot within a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Free,
    Allocated,
}

/// Fixed block of `N` slots plus the state of each slot.
///
/// `states[i]` and `storage[i]` describe the same slot. The storage never moves once reserved, so
/// values placed in it stay put for the life of the chunk.
pub(crate) struct Chunk<T, const N: usize> {
    states: Box<[SlotState]>,
    storage: Box<[MaybeUninit<T>]>,
}

/// Reserves exactly `len` elements, reporting failure instead of aborting.
fn reserve<X>(len: usize) -> Result<Vec<X>> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len)
        .map_err(|_| Error::SystemOutOfMemory)?;
    Ok(vec)
}

impl<T, const N: usize> Chunk<T, N> {
    /// Creates a chunk whose first `allocated` slots are marked [`SlotState::Allocated`].
    pub(crate) fn new(allocated: usize) -> Result<Self> {
        debug_assert!(allocated <= N);

        let mut storage = reserve(N)?;
        storage.resize_with(N, MaybeUninit::uninit);
        let mut states = reserve(N)?;
        states.extend((0..N).map(|i| {
            if i < allocated {
                SlotState::Allocated
            } else {
                SlotState::Free
            }
        }));

        Ok(Self {
            states: states.into_boxed_slice(),
            storage: storage.into_boxed_slice(),
        })
    }

    pub(crate) fn states(&self) -> &[SlotState] {
        &self.states
    }

    pub(crate) fn allocated(&self) -> usize {
        self.states
            .iter()
            .filter(|state| **state == SlotState::Allocated)
            .count()
    }

    /// Finds the first run of `count` consecutive free slots, scanning left to right.
    ///
    /// The window `[start, i]` only ever covers free slots: an allocated slot moves `start` just
    /// past it.
    pub(crate) fn find_run(&self, count: usize) -> Option<usize> {
        let mut start = 0;
        for (i, state) in self.states.iter().enumerate() {
            match state {
                SlotState::Allocated => start = i + 1,
                SlotState::Free if i + 1 - start == count => return Some(start),
                SlotState::Free => {}
            }
        }
        None
    }

    pub(crate) fn mark(&mut self, offset: usize, count: usize, state: SlotState) {
        for slot in &mut self.states[offset..offset + count] {
            *slot = state;
        }
    }

    pub(crate) fn is_marked(&self, offset: usize, count: usize, state: SlotState) -> bool {
        self.states[offset..offset + count]
            .iter()
            .all(|slot| *slot == state)
    }

    pub(crate) fn write(&mut self, offset: usize, value: T) -> &mut T {
        self.storage[offset].write(value)
    }

    /// # Safety
    ///
    /// The slot at `offset` must hold an initialized value.
    pub(crate) unsafe fn get(&self, offset: usize) -> &T {
        self.storage[offset].assume_init_ref()
    }

    /// # Safety
    ///
    /// The slot at `offset` must hold an initialized value.
    pub(crate) unsafe fn get_mut(&mut self, offset: usize) -> &mut T {
        self.storage[offset].assume_init_mut()
    }

    /// Moves the value out, leaving the slot uninitialized.
    ///
    /// # Safety
    ///
    /// The slot at `offset` must hold an initialized value.
    pub(crate) unsafe fn read(&mut self, offset: usize) -> T {
        self.storage[offset].assume_init_read()
    }

    /// # Safety
    ///
    /// The slot at `offset` must hold an initialized value.
    pub(crate) unsafe fn drop_in_place(&mut self, offset: usize) {
        self.storage[offset].assume_init_drop();
    }

    /// Address of the first slot, used to check that chunks never alias.
    #[cfg(test)]
    pub(crate) fn base(&self) -> *const T {
        self.storage.as_ptr().cast()
    }
}

/// Every chunk owned by one allocator.
///
/// Chunks are stored in creation order; index `len() - 1` is the head (newest) chunk and searches
/// start there.
pub(crate) struct ChunkList<T, const N: usize> {
    chunks: Vec<Chunk<T, N>>,
}

impl<T, const N: usize> ChunkList<T, N> {
    pub(crate) const fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Index of the most recently added chunk.
    pub(crate) fn head(&self) -> Option<usize> {
        self.chunks.len().checked_sub(1)
    }

    /// Adds `chunk` as the new head, returning its index.
    pub(crate) fn push(&mut self, chunk: Chunk<T, N>) -> Result<usize> {
        self.chunks
            .try_reserve(1)
            .map_err(|_| Error::SystemOutOfMemory)?;
        self.chunks.push(chunk);
        Ok(self.chunks.len() - 1)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Chunk<T, N>> {
        self.chunks.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Chunk<T, N>> {
        self.chunks.get_mut(index)
    }

    /// Chunks with their indices, newest first.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Chunk<T, N>)> {
        self.chunks.iter_mut().enumerate().rev()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Chunk<T, N>> {
        self.chunks.iter().rev()
    }
}

impl<T, const N: usize> Drop for ChunkList<T, N> {
    fn drop(&mut self) {
        #[cfg(feature = "log")]
        log::trace!("ChunkList::drop({} chunks)", self.chunks.len());
    }
}

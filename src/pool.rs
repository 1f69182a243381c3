use std::fmt;

use crate::chunk::{Chunk, ChunkList};
use crate::{Error, Result, SlotAllocator, SlotState};

/// Position of a slot: the chunk it lives in and its offset within that chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    chunk: usize,
    offset: usize,
}

impl Slot {
    /// Index of the owning chunk, in creation order.
    #[must_use]
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The slot `count` positions further along the same chunk.
    #[must_use]
    pub fn add(self, count: usize) -> Self {
        Self {
            chunk: self.chunk,
            offset: self.offset + count,
        }
    }
}

/// What happens when no chunk has room for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Allocation fails with [`Error::OutOfMemory`].
    Fixed,
    /// A new chunk is created.
    Growable,
}

/// Pool allocator handing out runs of up to `N` contiguous `T` slots.
///
/// No memory is reserved until the first allocation. A fixed allocator (`GROW = false`) never
/// owns more than that first chunk; a growable one adds a chunk whenever no existing chunk has a
/// long enough free run. Chunks are released only when the allocator is dropped.
///
/// The allocator tracks which slots are reserved, not which hold values, so dropping it frees the
/// chunk memory without dropping any values left inside.
pub struct Allocator<T, const N: usize, const GROW: bool = false> {
    chunks: ChunkList<T, N>,
}

pub type GrowableAllocator<T, const N: usize> = Allocator<T, N, true>;

impl<T, const N: usize, const GROW: bool> Allocator<T, N, GROW> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chunks: ChunkList::new(),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> Expansion {
        if GROW {
            Expansion::Growable
        } else {
            Expansion::Fixed
        }
    }

    /// Reserves `count` contiguous slots in one chunk.
    ///
    /// Chunks are searched newest first, each one left to right, and the first long enough free
    /// run is taken.
    ///
    /// # Errors
    ///
    /// - [`Error::ZeroCount`] when `count` is zero.
    /// - [`Error::CapacityExceeded`] when `count > N`.
    /// - [`Error::OutOfMemory`] when the allocator is fixed and no chunk has room.
    /// - [`Error::SystemOutOfMemory`] when a new chunk cannot be reserved.
    pub fn allocate(&mut self, count: usize) -> Result<Slot> {
        #[cfg(feature = "log")]
        log::trace!("Allocator::allocate({count})");

        if count == 0 {
            return Err(Error::ZeroCount);
        }
        if count > N {
            #[cfg(feature = "log")]
            log::debug!("Allocator::allocate: {count} exceeds chunk capacity {N}");
            return Err(Error::CapacityExceeded {
                requested: count,
                capacity: N,
            });
        }
        if self.chunks.is_empty() {
            return self.expand_and_allocate(count);
        }

        for (index, chunk) in self.chunks.iter_mut() {
            if let Some(offset) = chunk.find_run(count) {
                chunk.mark(offset, count, SlotState::Allocated);
                return Ok(Slot {
                    chunk: index,
                    offset,
                });
            }
        }

        if GROW {
            self.expand_and_allocate(count)
        } else {
            #[cfg(feature = "log")]
            log::debug!("Allocator::allocate: no free run of {count}");
            Err(Error::OutOfMemory { requested: count })
        }
    }

    fn expand_and_allocate(&mut self, count: usize) -> Result<Slot> {
        let chunk = self.chunks.push(Chunk::new(count)?)?;

        #[cfg(feature = "log")]
        log::debug!("Allocator: created chunk {chunk} of {N} slots");

        Ok(Slot { chunk, offset: 0 })
    }

    /// Marks the `count` slots starting at `slot` free again.
    ///
    /// The chunk is kept even when it becomes entirely free.
    ///
    /// # Panics
    ///
    /// When `slot` names a chunk this allocator does not own or the run passes the end of the
    /// chunk. In debug builds, also when any slot in the run is already free.
    pub fn deallocate(&mut self, slot: Slot, count: usize) {
        #[cfg(feature = "log")]
        log::trace!("Allocator::deallocate({slot:?}, {count})");

        let chunk = self.chunk_mut(slot);
        assert!(
            count <= N && slot.offset <= N - count,
            "run of {count} at {slot:?} passes the end of a {N} slot chunk"
        );
        debug_assert!(
            chunk.is_marked(slot.offset, count, SlotState::Allocated),
            "deallocating free slots at {slot:?}"
        );
        chunk.mark(slot.offset, count, SlotState::Free);
    }

    /// Writes `value` into `slot` without touching the slot's state.
    ///
    /// # Panics
    ///
    /// When `slot` is outside this allocator's chunks.
    pub fn construct(&mut self, slot: Slot, value: T) -> &mut T {
        self.chunk_mut(slot).write(slot.offset, value)
    }

    /// Drops the value in `slot` without touching the slot's state.
    ///
    /// # Safety
    ///
    /// `slot` must hold a value placed by [`Allocator::construct`] that has not since been
    /// destroyed or taken.
    pub unsafe fn destroy(&mut self, slot: Slot) {
        self.chunk_mut(slot).drop_in_place(slot.offset);
    }

    /// # Safety
    ///
    /// Same as [`Allocator::destroy`].
    pub unsafe fn take(&mut self, slot: Slot) -> T {
        self.chunk_mut(slot).read(slot.offset)
    }

    /// # Safety
    ///
    /// Same as [`Allocator::destroy`].
    pub unsafe fn get(&self, slot: Slot) -> &T {
        self.chunk(slot).get(slot.offset)
    }

    /// # Safety
    ///
    /// Same as [`Allocator::destroy`].
    pub unsafe fn get_mut(&mut self, slot: Slot) -> &mut T {
        self.chunk_mut(slot).get_mut(slot.offset)
    }

    /// Number of slots in a chunk, the longest run one allocation can return.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        N
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Index of the newest chunk, which is searched first.
    #[must_use]
    pub fn head(&self) -> Option<usize> {
        self.chunks.head()
    }

    /// State of every slot in chunk `chunk`.
    #[must_use]
    pub fn states(&self, chunk: usize) -> Option<&[SlotState]> {
        self.chunks.get(chunk).map(Chunk::states)
    }

    /// Allocated slots across all chunks.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.chunks.iter().map(Chunk::allocated).sum()
    }

    fn chunk(&self, slot: Slot) -> &Chunk<T, N> {
        let Some(chunk) = self.chunks.get(slot.chunk) else {
            panic!("{slot:?} does not belong to this allocator");
        };
        chunk
    }

    fn chunk_mut(&mut self, slot: Slot) -> &mut Chunk<T, N> {
        let Some(chunk) = self.chunks.get_mut(slot.chunk) else {
            panic!("{slot:?} does not belong to this allocator");
        };
        chunk
    }
}

impl<T, const N: usize, const GROW: bool> SlotAllocator for Allocator<T, N, GROW> {
    type Value = T;
    type Handle = Slot;
    type Rebound<U> = Allocator<U, N, GROW>;

    fn allocate(&mut self, count: usize) -> Result<Slot> {
        Allocator::allocate(self, count)
    }

    fn deallocate(&mut self, handle: Slot, count: usize) {
        Allocator::deallocate(self, handle, count);
    }

    fn advance(&self, handle: Slot, index: usize) -> Slot {
        handle.add(index)
    }

    unsafe fn construct(&mut self, handle: Slot, value: T) -> &mut T {
        Allocator::construct(self, handle, value)
    }

    unsafe fn destroy(&mut self, handle: Slot) {
        Allocator::destroy(self, handle);
    }

    unsafe fn take(&mut self, handle: Slot) -> T {
        Allocator::take(self, handle)
    }

    unsafe fn get(&self, handle: Slot) -> &T {
        Allocator::get(self, handle)
    }

    unsafe fn get_mut(&mut self, handle: Slot) -> &mut T {
        Allocator::get_mut(self, handle)
    }

    fn rebind<U>(&self) -> Allocator<U, N, GROW> {
        Allocator::new()
    }

    fn max_size(&self) -> usize {
        N
    }
}

impl<T, const N: usize, const GROW: bool> Default for Allocator<T, N, GROW> {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces an empty allocator; chunks are never shared between instances.
impl<T, const N: usize, const GROW: bool> Clone for Allocator<T, N, GROW> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Allocators of the same type are interchangeable whatever chunks they hold.
impl<T, const N: usize, const GROW: bool> PartialEq for Allocator<T, N, GROW> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
impl<T, const N: usize, const GROW: bool> Eq for Allocator<T, N, GROW> {}

impl<T, const N: usize, const GROW: bool> fmt::Debug for Allocator<T, N, GROW> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("capacity", &N)
            .field("policy", &self.policy())
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::pedantic)]

    use std::cell::Cell;
    use std::rc::Rc;

    use rand::Rng;

    use super::*;

    use crate::SlotState::{Allocated as A, Free as F};

    #[derive(Debug, PartialEq)]
    struct Value {
        number: i32,
        text: String,
    }
    impl Value {
        fn new(number: i32, text: &str) -> Self {
            Self {
                number: number.max(0),
                text: text.to_owned(),
            }
        }
    }

    struct Counted(Rc<Cell<usize>>);
    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn allocator_debug() {
        assert_eq!(
            format!("{:?}", Allocator::<u8, 3>::new()),
            "Allocator { capacity: 3, policy: Fixed, chunks: 0 }"
        );
        assert_eq!(
            format!("{:?}", GrowableAllocator::<u8, 2>::new()),
            "Allocator { capacity: 2, policy: Growable, chunks: 0 }"
        );
    }
    #[test]
    fn slot_debug() {
        assert_eq!(
            format!("{:?}", Slot { chunk: 1, offset: 2 }),
            "Slot { chunk: 1, offset: 2 }"
        );
    }
    #[test]
    fn slot_add() {
        let slot = Slot { chunk: 1, offset: 2 }.add(3);
        assert_eq!(slot.chunk(), 1);
        assert_eq!(slot.offset(), 5);
    }

    #[test]
    fn new_has_no_chunks() {
        let memory = Allocator::<i32, 10>::new();
        assert_eq!(memory.chunk_count(), 0);
        assert_eq!(memory.head(), None);
        assert_eq!(memory.states(0), None);
        assert_eq!(memory.allocated(), 0);
    }

    #[test]
    fn allocate_whole_chunk() {
        let mut memory = Allocator::<i32, 10>::new();
        let slot = memory.allocate(10).unwrap();
        assert_eq!(slot, Slot { chunk: 0, offset: 0 });
        assert_eq!(memory.chunk_count(), 1);
        assert_eq!(memory.states(0).unwrap(), &[A; 10]);
    }
    #[test]
    fn allocate_prefix_of_fresh_chunk() {
        for n in 1..=6 {
            let mut memory = Allocator::<u16, 6>::new();
            memory.allocate(n).unwrap();
            let states = memory.states(0).unwrap();
            assert!(states[..n].iter().all(|s| *s == A));
            assert!(states[n..].iter().all(|s| *s == F));
        }
    }
    #[test]
    fn allocate_zero() {
        let mut memory = Allocator::<i32, 10>::new();
        assert_eq!(memory.allocate(0), Err(Error::ZeroCount));
        assert_eq!(memory.chunk_count(), 0);
    }
    #[test]
    fn allocate_over_capacity() {
        let mut memory = Allocator::<i32, 10>::new();
        assert_eq!(
            memory.allocate(11),
            Err(Error::CapacityExceeded {
                requested: 11,
                capacity: 10
            })
        );
        assert_eq!(memory.chunk_count(), 0);

        let mut memory = GrowableAllocator::<i32, 10>::new();
        assert!(matches!(
            memory.allocate(11),
            Err(Error::CapacityExceeded { .. })
        ));
        assert_eq!(memory.chunk_count(), 0);
    }
    #[test]
    fn allocate_zero_capacity() {
        let mut memory = GrowableAllocator::<i32, 0>::new();
        assert!(matches!(
            memory.allocate(1),
            Err(Error::CapacityExceeded { .. })
        ));
        assert_eq!(memory.chunk_count(), 0);
    }
    #[test]
    fn allocate_consecutive_runs() {
        let mut memory = Allocator::<i32, 10>::new();
        let a = memory.allocate(2).unwrap();
        let b = memory.allocate(4).unwrap();
        assert_eq!(b, a.add(2));
        assert_eq!(memory.states(0).unwrap(), &[A, A, A, A, A, A, F, F, F, F]);
        assert_eq!(
            memory.allocate(8),
            Err(Error::OutOfMemory { requested: 8 })
        );
        // The failed request left nothing behind.
        assert_eq!(memory.allocated(), 6);
        assert_eq!(memory.chunk_count(), 1);
    }
    #[test]
    fn allocate_fixed_never_grows() {
        let mut memory = Allocator::<i32, 3>::new();
        memory.allocate(3).unwrap();
        assert_eq!(
            memory.allocate(1),
            Err(Error::OutOfMemory { requested: 1 })
        );
        assert_eq!(memory.chunk_count(), 1);
    }
    #[test]
    fn allocate_growable_adds_chunk() {
        let mut memory = GrowableAllocator::<u64, 4>::new();
        let first = memory.allocate(4).unwrap();
        let second = memory.allocate(1).unwrap();
        assert_eq!(memory.chunk_count(), 2);
        assert_eq!(memory.head(), Some(1));
        assert_eq!(second, Slot { chunk: 1, offset: 0 });
        assert_ne!(first.chunk(), second.chunk());
        assert_eq!(memory.states(0).unwrap(), &[A; 4]);
        assert_eq!(memory.states(1).unwrap(), &[A, F, F, F]);

        let base = |chunk| memory.chunks.get(chunk).unwrap().base() as usize;
        assert!(base(0).abs_diff(base(1)) >= 4 * std::mem::size_of::<u64>());
    }
    #[test]
    fn allocate_growable_searches_newest_first() {
        let mut memory = GrowableAllocator::<u8, 4>::new();
        let a = memory.allocate(3).unwrap();
        memory.allocate(2).unwrap(); // chunk 1
        memory.deallocate(a, 3);

        // Chunk 0 is now empty, but chunk 1 is searched first and still has room.
        assert_eq!(memory.allocate(1).unwrap(), Slot { chunk: 1, offset: 2 });
        assert_eq!(memory.allocate(1).unwrap(), Slot { chunk: 1, offset: 3 });
        // Chunk 1 is full, so the older chunk is used before growing again.
        assert_eq!(memory.allocate(2).unwrap(), Slot { chunk: 0, offset: 0 });
        assert_eq!(memory.chunk_count(), 2);
    }
    #[test]
    fn allocate_growable_run_too_long_for_any_chunk() {
        let mut memory = GrowableAllocator::<u8, 4>::new();
        memory.allocate(1).unwrap();
        let b = memory.allocate(1).unwrap();
        memory.allocate(1).unwrap();
        memory.deallocate(b, 1);
        // [A, F, A, F] has two free slots but no run of 2.
        assert_eq!(memory.allocate(2).unwrap(), Slot { chunk: 1, offset: 0 });
    }

    #[test]
    fn deallocate_whole_chunk() {
        let mut memory = Allocator::<i32, 10>::new();
        let slot = memory.allocate(10).unwrap();
        memory.deallocate(slot, 10);
        assert_eq!(memory.states(0).unwrap(), &[F; 10]);
        // Chunks are kept once created.
        assert_eq!(memory.chunk_count(), 1);
    }
    #[test]
    fn deallocate_then_reuse() {
        let mut memory = Allocator::<i32, 5>::new();

        let mem1 = memory.allocate(2).unwrap();
        let mem2 = memory.allocate(1).unwrap();
        let mem3 = memory.allocate(1).unwrap();
        let mem4 = memory.allocate(1).unwrap();
        assert_eq!(memory.states(0).unwrap(), &[A, A, A, A, A]);

        memory.deallocate(mem2, 1);
        assert_eq!(memory.states(0).unwrap(), &[A, A, F, A, A]);

        memory.deallocate(mem4, 1);
        assert_eq!(memory.states(0).unwrap(), &[A, A, F, A, F]);

        let mem5 = memory.allocate(1).unwrap();
        assert_eq!(mem5, mem2);
        assert_eq!(memory.states(0).unwrap(), &[A, A, A, A, F]);

        memory.deallocate(mem1, 2);
        assert_eq!(memory.states(0).unwrap(), &[F, F, A, A, F]);

        memory.deallocate(mem3, 1);
        assert_eq!(memory.states(0).unwrap(), &[F, F, A, F, F]);

        memory.deallocate(mem5, 1);
        assert_eq!(memory.states(0).unwrap(), &[F; 5]);
        assert_eq!(memory.chunk_count(), 1);
    }
    #[test]
    fn deallocate_reuses_same_size_run() {
        let mut memory = Allocator::<u8, 8>::new();
        memory.allocate(2).unwrap();
        let b = memory.allocate(3).unwrap();
        memory.allocate(2).unwrap();
        memory.deallocate(b, 3);
        assert_eq!(memory.allocate(3).unwrap(), b);
    }
    #[test]
    #[should_panic(expected = "does not belong to this allocator")]
    fn deallocate_foreign_chunk() {
        let mut memory = Allocator::<u8, 4>::new();
        memory.allocate(1).unwrap();
        memory.deallocate(Slot { chunk: 3, offset: 0 }, 1);
    }
    #[test]
    #[should_panic(expected = "passes the end")]
    fn deallocate_past_end() {
        let mut memory = Allocator::<u8, 4>::new();
        let slot = memory.allocate(2).unwrap();
        memory.deallocate(slot.add(3), 2);
    }
    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "deallocating free slots")]
    fn deallocate_twice() {
        let mut memory = Allocator::<u8, 4>::new();
        let slot = memory.allocate(2).unwrap();
        memory.deallocate(slot, 2);
        memory.deallocate(slot, 2);
    }

    #[test]
    fn construct_standard_type() {
        let mut memory = Allocator::<i32, 5>::new();
        let mem1 = memory.allocate(2).unwrap();
        let mem2 = memory.allocate(1).unwrap();
        assert_eq!(memory.states(0).unwrap(), &[A, A, A, F, F]);

        memory.construct(mem1, 5);
        memory.construct(mem1.add(1), 2);
        memory.construct(mem2, 38);
        // Construction does not touch the state map.
        assert_eq!(memory.states(0).unwrap(), &[A, A, A, F, F]);

        unsafe {
            assert_eq!(*memory.get(mem1), 5);
            assert_eq!(*memory.get(mem1.add(1)), 2);
            assert_eq!(*memory.get(mem2), 38);
        }
    }
    #[test]
    fn construct_custom_type() {
        let mut memory = Allocator::<Value, 3>::new();
        let slot = memory.allocate(3).unwrap();
        memory.construct(slot, Value::new(1, "v1"));
        memory.construct(slot.add(1), Value::new(2, "v2"));
        memory.construct(slot.add(2), Value::new(-3, "v3"));

        unsafe {
            assert_eq!(memory.get(slot), &Value::new(1, "v1"));
            assert_eq!(memory.get(slot.add(1)), &Value::new(2, "v2"));
            assert_eq!(memory.get(slot.add(2)), &Value::new(0, "v3"));

            memory.get_mut(slot).text.push('!');
            assert_eq!(memory.take(slot), Value::new(1, "v1!"));
            memory.destroy(slot.add(1));
            memory.destroy(slot.add(2));
        }
        memory.deallocate(slot, 3);
    }
    #[test]
    fn construct_returns_slot_value() {
        let mut memory = Allocator::<String, 1>::new();
        let slot = memory.allocate(1).unwrap();
        memory.construct(slot, String::from("abc")).push('d');
        assert_eq!(unsafe { memory.take(slot) }, "abcd");
    }
    #[test]
    fn destroy_drops_once_and_keeps_state() {
        let drops = Rc::new(Cell::new(0));
        let mut memory = Allocator::<Counted, 3>::new();
        let slot = memory.allocate(3).unwrap();
        for i in 0..3 {
            memory.construct(slot.add(i), Counted(drops.clone()));
        }

        unsafe { memory.destroy(slot.add(1)) };
        assert_eq!(drops.get(), 1);
        assert_eq!(memory.states(0).unwrap(), &[A, A, A]);

        unsafe {
            memory.destroy(slot);
            memory.destroy(slot.add(2));
        }
        assert_eq!(drops.get(), 3);
        memory.deallocate(slot, 3);
    }
    #[test]
    #[should_panic(expected = "does not belong to this allocator")]
    fn construct_without_chunk() {
        let mut memory = Allocator::<u8, 4>::new();
        memory.construct(Slot { chunk: 0, offset: 0 }, 1);
    }
    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn construct_past_chunk_end() {
        let mut memory = Allocator::<u8, 4>::new();
        let slot = memory.allocate(4).unwrap();
        memory.construct(slot.add(4), 1);
    }
    #[test]
    fn construct_through_contract() {
        let mut memory = GrowableAllocator::<u8, 2>::new();
        let slot = SlotAllocator::allocate(&mut memory, 2).unwrap();
        let second = memory.advance(slot, 1);
        let value = unsafe { SlotAllocator::construct(&mut memory, second, 7) };
        *value += 1;
        assert_eq!(unsafe { *memory.get(slot.add(1)) }, 8);
        SlotAllocator::deallocate(&mut memory, slot, 2);
    }

    #[test]
    fn max_size() {
        assert_eq!(Allocator::<u8, 7>::new().max_size(), 7);
        assert_eq!(SlotAllocator::max_size(&GrowableAllocator::<u8, 9>::new()), 9);
    }
    #[test]
    fn policy() {
        assert_eq!(Allocator::<u8, 1>::new().policy(), Expansion::Fixed);
        assert_eq!(GrowableAllocator::<u8, 1>::new().policy(), Expansion::Growable);
    }
    #[test]
    fn equality_ignores_chunks() {
        let mut a = Allocator::<u8, 4>::new();
        let b = Allocator::<u8, 4>::default();
        a.allocate(2).unwrap();
        assert_eq!(a, b);
    }
    #[test]
    fn clone_is_empty() {
        let mut a = Allocator::<u8, 4>::new();
        a.allocate(2).unwrap();
        let b = a.clone();
        assert_eq!(b.chunk_count(), 0);
        assert_eq!(a.chunk_count(), 1);
    }
    #[test]
    fn move_transfers_chunks() {
        let mut a = GrowableAllocator::<u32, 2>::new();
        let slot = a.allocate(2).unwrap();
        a.construct(slot, 7);
        a.allocate(1).unwrap();
        let b = a;
        assert_eq!(b.chunk_count(), 2);
        assert_eq!(unsafe { *b.get(slot) }, 7);
    }
    #[test]
    fn rebind_keeps_configuration() {
        let mut a = GrowableAllocator::<u8, 3>::new();
        a.allocate(1).unwrap();
        let b: GrowableAllocator<String, 3> = a.rebind();
        assert_eq!(b.chunk_count(), 0);
        assert_eq!(b.max_size(), 3);
        assert_eq!(b.policy(), Expansion::Growable);
    }

    #[test]
    fn drop_frees_every_chunk() {
        let drops = Rc::new(Cell::new(0));
        let mut memory = GrowableAllocator::<Counted, 2>::new();
        for _ in 0..5 {
            let slot = memory.allocate(2).unwrap();
            memory.construct(slot, Counted(drops.clone()));
        }
        assert_eq!(memory.chunk_count(), 5);
        drop(memory);
        // Values still in slots are not dropped with the allocator.
        assert_eq!(drops.get(), 0);
        assert_eq!(Rc::strong_count(&drops), 6);
    }

    // Random allocations and deallocations checked against a model of the state map.
    #[test]
    fn random_against_model() {
        const SIZE: usize = 16;
        const ROUNDS: usize = 10_000;

        let mut rng = rand::thread_rng();
        let mut memory = GrowableAllocator::<usize, SIZE>::new();
        let mut model: Vec<[SlotState; SIZE]> = Vec::new();
        let mut live: Vec<(Slot, usize)> = Vec::new();

        for _ in 0..ROUNDS {
            if live.is_empty() || rng.gen_bool(0.55) {
                let count = rng.gen_range(1..=SIZE / 2);
                let slot = memory.allocate(count).unwrap();

                if slot.chunk() == model.len() {
                    model.push([F; SIZE]);
                }
                let states = &mut model[slot.chunk()];
                assert!(states[slot.offset()..slot.offset() + count]
                    .iter()
                    .all(|s| *s == F));
                for state in &mut states[slot.offset()..slot.offset() + count] {
                    *state = A;
                }
                for i in 0..count {
                    memory.construct(slot.add(i), slot.chunk() * SIZE + slot.offset() + i);
                }
                live.push((slot, count));
            } else {
                let (slot, count) = live.swap_remove(rng.gen_range(0..live.len()));
                for i in 0..count {
                    let value = unsafe { memory.take(slot.add(i)) };
                    assert_eq!(value, slot.chunk() * SIZE + slot.offset() + i);
                }
                memory.deallocate(slot, count);
                for state in &mut model[slot.chunk()][slot.offset()..slot.offset() + count] {
                    *state = F;
                }
            }

            assert_eq!(memory.chunk_count(), model.len());
            for (chunk, states) in model.iter().enumerate() {
                assert_eq!(memory.states(chunk).unwrap(), states);
            }
        }
    }
}

//! The pool descriptor and its allocate/free protocol.
//!
//! # Allocation protocol
//!
//! [`SlotPool::alloc`] scans the slots in index order. A slot that looks
//! free is only a candidate: the flag is checked again inside the critical
//! section, because an interrupt handler may have claimed the slot between
//! the unlocked read and entering the section. If that happened the scan
//! starts over from slot 0.
//!
//! ```text
//! scan ──► slot i looks free ──► enter ──► still free? ──yes──► mark taken, leave, Some
//!  ▲                                          │
//!  └──────────────────── leave ◄──────no──────┘
//! ```
//!
//! Restarting from the beginning keeps the loop trivially correct under any
//! depth of preemption. There is no fairness guarantee between contending
//! contexts: a context that keeps losing the race keeps rescanning.

use core::{fmt, mem, mem::MaybeUninit, ptr::NonNull, slice};

use snafu::{OptionExt as _, ensure};

use crate::{
    critical_section::CriticalSection,
    error::{
        self, ContractViolation, ForeignHandleSnafu, IndexOutOfRangeSnafu, InteriorPointerSnafu,
        MisalignedMemorySnafu, NotTakenSnafu, NullMemorySnafu, PointerBelowBaseSnafu,
    },
    handle::SlotHandle,
    slot::Slot,
};

/// A fixed number of equally sized slots over caller-owned memory.
///
/// The pool borrows its memory for `'m` and never frees it. All operations
/// take `&self`, so a pool placed in a `static` (or otherwise shared) can be
/// used from thread mode and from interrupt handlers of any priority at once.
pub struct SlotPool<'m, T, C> {
    slots: &'m [Slot<T>],
    section: C,
}

impl<T, C> fmt::Debug for SlotPool<'_, T, C>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("capacity", &self.capacity())
            .field("slot_size", &Self::SLOT_SIZE)
            .field("taken", &self.taken_count())
            .field("section", &self.section)
            .finish()
    }
}

impl<'m, T, C> SlotPool<'m, T, C>
where
    C: CriticalSection,
{
    /// Creates a pool over typed slot storage. Every slot is marked free.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::{InterruptSection, Slot, SlotPool};
    ///
    /// let mut storage = [const { Slot::<[u8; 32]>::new() }; 2];
    /// let pool = SlotPool::new(&mut storage, InterruptSection);
    ///
    /// let mut buf = pool.alloc().unwrap();
    /// buf.write([0xa5; 32]);
    /// pool.free(buf);
    /// ```
    #[must_use]
    pub fn new(storage: &'m mut [Slot<T>], section: C) -> Self {
        for slot in storage.iter_mut() {
            slot.reset();
        }
        debug!(
            "slot pool initialized: {} slots of {} bytes",
            storage.len(),
            Self::SLOT_SIZE
        );
        Self {
            slots: storage,
            section,
        }
    }

    /// Creates a pool over `size` bytes of raw memory starting at `memory`.
    ///
    /// The capacity is `size / SLOT_SIZE`; trailing bytes that do not make up
    /// a whole slot are left untouched. A capacity of zero is valid, and then
    /// `memory` may be null.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is non-zero and `memory` is null or not aligned
    /// for `Slot<T>`.
    ///
    /// # Safety
    ///
    /// When the capacity is non-zero, `memory..memory + size` must be valid
    /// for reads and writes for all of `'m` and must not be accessed other
    /// than through the pool during that time.
    #[track_caller]
    pub unsafe fn from_raw_parts(memory: *mut u8, size: usize, section: C) -> Self {
        match unsafe { Self::try_from_raw_parts(memory, size, section) } {
            Ok(pool) => pool,
            Err(err) => error::report(err),
        }
    }

    /// Like [`from_raw_parts`](Self::from_raw_parts), but returns the
    /// contract violation instead of panicking.
    ///
    /// # Safety
    ///
    /// Same as [`from_raw_parts`](Self::from_raw_parts).
    pub unsafe fn try_from_raw_parts(
        memory: *mut u8,
        size: usize,
        section: C,
    ) -> Result<Self, ContractViolation> {
        let capacity = size / Self::SLOT_SIZE;
        let remainder = size % Self::SLOT_SIZE;
        if capacity == 0 {
            debug!(
                "slot pool initialized empty: {size} bytes hold no {}-byte slot",
                Self::SLOT_SIZE
            );
            return Ok(Self {
                slots: &[],
                section,
            });
        }

        ensure!(!memory.is_null(), NullMemorySnafu { capacity });
        let base = memory.cast::<Slot<T>>();
        ensure!(
            base.is_aligned(),
            MisalignedMemorySnafu {
                address: memory.addr(),
                align: mem::align_of::<Slot<T>>(),
            }
        );

        for index in 0..capacity {
            unsafe {
                base.add(index).write(Slot::new());
            }
        }
        let slots = unsafe { slice::from_raw_parts(base, capacity) };

        debug!(
            "slot pool initialized at {:#x}: {capacity} slots of {} bytes, {remainder} bytes unused",
            memory.addr(),
            Self::SLOT_SIZE
        );
        Ok(Self { slots, section })
    }

    /// Claims the first free slot.
    ///
    /// Returns `None` if every slot is taken; this never blocks or waits.
    #[must_use]
    pub fn alloc(&self) -> Option<SlotHandle<'m, T>> {
        let slots = self.slots;
        'scan: loop {
            for (index, slot) in slots.iter().enumerate() {
                if slot.is_taken() {
                    continue;
                }

                let claimed = {
                    let _guard = self.section.enter();
                    slot.claim()
                };
                if !claimed {
                    trace!("slot {index} was claimed by a preempting context, rescanning");
                    continue 'scan;
                }

                return Some(SlotHandle::new(index, slot.data_ptr()));
            }

            trace!("slot pool exhausted: all {} slots taken", slots.len());
            return None;
        }
    }

    /// Returns an allocated slot to the pool.
    ///
    /// The payload is left as is.
    ///
    /// # Panics
    ///
    /// Panics if `handle` was not issued by this pool.
    #[track_caller]
    pub fn free(&self, handle: SlotHandle<'m, T>) {
        let index = handle.index();
        let result = self
            .check_handle(index, handle.as_ptr())
            .and_then(|slot| self.release(index, slot));
        if let Err(err) = result {
            error::report(err);
        }
    }

    /// Returns the slot whose payload starts at `ptr` to the pool.
    ///
    /// The slot index is recovered from the distance between `ptr` and the
    /// payload of slot 0.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` is not the exact payload address of a slot of this
    /// pool, or if that slot is not allocated.
    ///
    /// # Safety
    ///
    /// The caller must own the slot, typically through
    /// [`SlotHandle::into_raw`], and must not touch its payload afterwards.
    #[track_caller]
    pub unsafe fn free_raw(&self, ptr: NonNull<MaybeUninit<T>>) {
        let result = self
            .locate(ptr)
            .and_then(|(index, slot)| self.release(index, slot));
        if let Err(err) = result {
            error::report(err);
        }
    }

    /// Rebuilds the handle of an allocated slot from its payload pointer.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` is not the exact payload address of a slot of this
    /// pool, or if that slot is not allocated.
    ///
    /// # Safety
    ///
    /// The caller must own the slot, typically through
    /// [`SlotHandle::into_raw`], and must give up every other pointer to it.
    #[track_caller]
    pub unsafe fn handle_from_raw(&self, ptr: NonNull<MaybeUninit<T>>) -> SlotHandle<'m, T> {
        let result = self.locate(ptr).and_then(|(index, slot)| {
            ensure!(slot.is_taken(), NotTakenSnafu { index });
            Ok(SlotHandle::new(index, ptr))
        });
        match result {
            Ok(handle) => handle,
            Err(err) => error::report(err),
        }
    }

    fn check_handle(
        &self,
        index: usize,
        ptr: NonNull<MaybeUninit<T>>,
    ) -> Result<&'m Slot<T>, ContractViolation> {
        let slot = self.slots.get(index).context(IndexOutOfRangeSnafu {
            index,
            capacity: self.capacity(),
        })?;
        ensure!(
            slot.data_ptr() == ptr,
            ForeignHandleSnafu {
                index,
                address: ptr.as_ptr().addr(),
            }
        );
        Ok(slot)
    }

    fn locate(
        &self,
        ptr: NonNull<MaybeUninit<T>>,
    ) -> Result<(usize, &'m Slot<T>), ContractViolation> {
        let address = ptr.as_ptr().addr();
        let base = self.slots.as_ptr().addr() + Slot::<T>::DATA_OFFSET;
        ensure!(address >= base, PointerBelowBaseSnafu { address, base });

        let distance = address - base;
        let index = distance / Self::SLOT_SIZE;
        let offset = distance % Self::SLOT_SIZE;
        ensure!(
            offset == 0,
            InteriorPointerSnafu {
                address,
                index,
                offset,
            }
        );

        let slot = self.slots.get(index).context(IndexOutOfRangeSnafu {
            index,
            capacity: self.capacity(),
        })?;
        Ok((index, slot))
    }

    fn release(&self, index: usize, slot: &Slot<T>) -> Result<(), ContractViolation> {
        let was_taken = {
            let _guard = self.section.enter();
            slot.release()
        };
        ensure!(was_taken, NotTakenSnafu { index });
        Ok(())
    }
}

impl<T, C> SlotPool<'_, T, C> {
    /// Bytes occupied by one slot, flag and padding included.
    pub const SLOT_SIZE: usize = mem::size_of::<Slot<T>>();

    /// Number of slots, fixed at initialization.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the pool has no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots currently taken.
    ///
    /// This is a snapshot taken without the critical section; it may be stale
    /// as soon as it is returned.
    #[must_use]
    pub fn taken_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_taken()).count()
    }

    /// Number of slots currently free. Same caveat as
    /// [`taken_count`](Self::taken_count).
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.taken_count()
    }

    /// Whether slot `index` is taken, or `None` if there is no such slot.
    #[must_use]
    pub fn is_taken(&self, index: usize) -> Option<bool> {
        self.slots.get(index).map(Slot::is_taken)
    }

    #[must_use]
    pub fn section(&self) -> &C {
        &self.section
    }
}

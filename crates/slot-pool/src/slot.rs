//! Slot layout and typed slot storage.
//!
//! ```text
//! Slot<T> (repr(C)):
//! ┌──────────────┬─────────┬──────────────────────────┐
//! │ taken: bool  │ padding │ data: MaybeUninit<T>     │
//! └──────────────┴─────────┴──────────────────────────┘
//! ```
//!
//! Slots sit back to back, so slot `i` starts `i * size_of::<Slot<T>>()`
//! bytes after the first one.

use core::{
    cell::UnsafeCell,
    fmt,
    mem::{self, MaybeUninit},
    ptr::NonNull,
    sync::atomic::{AtomicBool, Ordering},
};

/// One fixed-size unit of a pool: an occupancy flag and room for a `T`.
///
/// The flag is read without a critical section while scanning, so it is an
/// atomic; every write to it happens inside the pool's critical section.
/// Where the target has byte-sized compare-and-swap, the write is also a
/// single atomic read-modify-write, so a section that only masks interrupts
/// on one core still never hands the same slot to two cores.
#[repr(C)]
pub struct Slot<T> {
    taken: AtomicBool,
    data: UnsafeCell<MaybeUninit<T>>,
}

// The payload is only reachable through the `SlotHandle` of its holder.
unsafe impl<T> Sync for Slot<T> where T: Send {}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("taken", &self.is_taken())
            .finish_non_exhaustive()
    }
}

impl<T> Slot<T> {
    /// Distance from the start of a slot to its payload.
    pub(crate) const DATA_OFFSET: usize = mem::offset_of!(Self, data);

    /// Creates a free slot with uninitialized payload.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            taken: AtomicBool::new(false),
            data: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    pub(crate) fn is_taken(&self) -> bool {
        self.taken.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&mut self) {
        *self.taken.get_mut() = false;
    }

    /// Marks the slot taken if it is free. Must be called inside the pool's
    /// critical section.
    #[cfg(target_has_atomic = "8")]
    pub(crate) fn claim(&self) -> bool {
        self.taken
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[cfg(not(target_has_atomic = "8"))]
    pub(crate) fn claim(&self) -> bool {
        if self.is_taken() {
            return false;
        }
        self.taken.store(true, Ordering::Relaxed);
        true
    }

    /// Marks the slot free and returns whether it was taken. Must be called
    /// inside the pool's critical section.
    #[cfg(target_has_atomic = "8")]
    pub(crate) fn release(&self) -> bool {
        self.taken.swap(false, Ordering::Release)
    }

    #[cfg(not(target_has_atomic = "8"))]
    pub(crate) fn release(&self) -> bool {
        let was_taken = self.is_taken();
        self.taken.store(false, Ordering::Relaxed);
        was_taken
    }

    pub(crate) fn data_ptr(&self) -> NonNull<MaybeUninit<T>> {
        NonNull::from(&self.data).cast()
    }
}

/// Storage for `N` slots that can be placed in a `static` and handed to a
/// pool exactly once.
///
/// # Examples
///
/// ```
/// use slot_pool::{InterruptSection, SlotPool, SlotStorage};
///
/// static RX_BUFFERS: SlotStorage<[u8; 64], 4> = SlotStorage::new();
///
/// let slots = RX_BUFFERS.take().unwrap();
/// let pool = SlotPool::new(slots, InterruptSection);
/// assert_eq!(pool.capacity(), 4);
/// assert!(RX_BUFFERS.take().is_none());
/// ```
pub struct SlotStorage<T, const N: usize> {
    handed_out: AtomicBool,
    slots: UnsafeCell<[Slot<T>; N]>,
}

unsafe impl<T, const N: usize> Sync for SlotStorage<T, N> where T: Send {}

impl<T, const N: usize> Default for SlotStorage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for SlotStorage<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotStorage")
            .field("len", &N)
            .field("handed_out", &self.handed_out.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T, const N: usize> SlotStorage<T, N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handed_out: AtomicBool::new(false),
            slots: UnsafeCell::new([const { Slot::new() }; N]),
        }
    }

    /// Hands out the slots. Returns `None` on every call after the first.
    #[must_use]
    #[expect(clippy::mut_from_ref)]
    pub fn take(&self) -> Option<&mut [Slot<T>]> {
        if self.handed_out.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(unsafe { &mut *self.slots.get() })
    }

    /// Returns the slots through an exclusive borrow, for storage that lives
    /// on the stack or inside another value.
    #[must_use]
    pub fn get_mut(&mut self) -> &mut [Slot<T>] {
        self.slots.get_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread};

    use super::*;

    #[test]
    fn test_slot_layout() {
        assert_eq!(mem::size_of::<Slot<[u8; 15]>>(), 16);
        assert_eq!(mem::size_of::<Slot<u32>>(), 8);
        assert_eq!(mem::align_of::<Slot<u32>>(), 4);
        assert_eq!(Slot::<u32>::DATA_OFFSET, 4);
        assert_eq!(Slot::<[u8; 15]>::DATA_OFFSET, 1);
    }

    #[test]
    fn test_claim_and_release() {
        let slot = Slot::<u64>::new();
        assert!(!slot.is_taken());
        assert!(slot.claim());
        assert!(slot.is_taken());
        assert!(!slot.claim());
        assert!(slot.release());
        assert!(!slot.is_taken());
        assert!(!slot.release());
    }

    #[test]
    fn test_racing_claims_have_one_winner() {
        const THREADS: usize = 8;

        for _ in 0..200 {
            let slot = Slot::<u8>::new();
            let barrier = Barrier::new(THREADS);
            let winners = thread::scope(|s| {
                let racers = (0..THREADS)
                    .map(|_| {
                        s.spawn(|| {
                            barrier.wait();
                            slot.claim()
                        })
                    })
                    .collect::<Vec<_>>();
                racers
                    .into_iter()
                    .map(|racer| racer.join().unwrap())
                    .filter(|&won| won)
                    .count()
            });
            assert_eq!(winners, 1);
        }
    }

    #[test]
    fn test_reset() {
        let mut slot = Slot::<u8>::new();
        assert!(slot.claim());
        slot.reset();
        assert!(!slot.is_taken());
    }

    #[test]
    fn test_data_ptr_follows_flag() {
        let slot = Slot::<u32>::new();
        let base = (&raw const slot).addr();
        assert_eq!(
            slot.data_ptr().as_ptr().addr(),
            base + Slot::<u32>::DATA_OFFSET
        );
    }

    #[test]
    fn test_storage_take_once() {
        let storage = SlotStorage::<u16, 3>::new();
        let slots = storage.take().unwrap();
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|slot| !slot.is_taken()));
        assert!(storage.take().is_none());
    }

    #[test]
    fn test_storage_get_mut() {
        let mut storage = SlotStorage::<u16, 5>::default();
        assert_eq!(storage.get_mut().len(), 5);
        // An exclusive borrow does not consume the one-shot `take`.
        assert!(storage.take().is_some());
    }
}

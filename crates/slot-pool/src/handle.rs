use core::{
    fmt,
    marker::PhantomData,
    mem::MaybeUninit,
    ops::{Deref, DerefMut},
    ptr::NonNull,
};

/// Exclusive ownership of one allocated slot.
///
/// Returned by [`SlotPool::alloc`](crate::SlotPool::alloc) and given back to
/// [`SlotPool::free`](crate::SlotPool::free). The handle is not `Clone`, so
/// the slot it names has exactly one holder. Dropping a handle without
/// freeing it keeps the slot taken for the rest of the pool's life.
///
/// The payload is a `MaybeUninit<T>`: a fresh slot holds whatever its
/// previous holder left behind, or nothing at all.
#[must_use = "a dropped handle leaks its slot until the pool is discarded"]
pub struct SlotHandle<'m, T> {
    index: usize,
    data: NonNull<MaybeUninit<T>>,
    _slot: PhantomData<&'m mut MaybeUninit<T>>,
}

unsafe impl<T> Send for SlotHandle<'_, T> where T: Send {}
unsafe impl<T> Sync for SlotHandle<'_, T> where T: Sync {}

impl<T> fmt::Debug for SlotHandle<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotHandle")
            .field("index", &self.index)
            .field("data", &self.data)
            .finish()
    }
}

impl<T> SlotHandle<'_, T> {
    pub(crate) fn new(index: usize, data: NonNull<MaybeUninit<T>>) -> Self {
        Self {
            index,
            data,
            _slot: PhantomData,
        }
    }

    /// Position of the slot within its pool.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Pointer to the slot's payload.
    #[must_use]
    pub fn as_ptr(&self) -> NonNull<MaybeUninit<T>> {
        self.data
    }

    /// Stores `value` in the payload and returns a reference to it.
    ///
    /// Any previous payload is overwritten without being dropped.
    pub fn write(&mut self, value: T) -> &mut T {
        MaybeUninit::write(self, value)
    }

    /// Gives up the handle and returns the payload pointer, for passing the
    /// buffer through code that only carries raw pointers (a DMA descriptor,
    /// a C driver).
    ///
    /// The slot stays taken. Give it back with
    /// [`SlotPool::free_raw`](crate::SlotPool::free_raw) or turn it back into
    /// a handle with [`SlotPool::handle_from_raw`](crate::SlotPool::handle_from_raw).
    #[must_use]
    pub fn into_raw(self) -> NonNull<MaybeUninit<T>> {
        self.data
    }
}

impl<T> Deref for SlotHandle<'_, T> {
    type Target = MaybeUninit<T>;

    fn deref(&self) -> &Self::Target {
        unsafe { self.data.as_ref() }
    }
}

impl<T> DerefMut for SlotHandle<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { self.data.as_mut() }
    }
}

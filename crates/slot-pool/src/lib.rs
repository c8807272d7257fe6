//! Fixed-size buffer pool for interrupt-driven devices.
//!
//! A [`SlotPool`] carves caller-owned memory into equally sized slots and
//! hands them out one at a time. It is meant for I/O buffers, such as radio
//! receive and transmit frames, that are allocated and freed from thread mode
//! and from interrupt handlers of any priority without a heap.
//!
//! - [`SlotPool::alloc`] returns a [`SlotHandle`] or `None` when every slot
//!   is taken. It never blocks.
//! - [`SlotPool::free`] gives the slot back.
//! - Each occupancy flag update runs inside a [`CriticalSection`]. Nothing
//!   else does: the scan over the slots and the payload are outside it.
//!
//! # Usage Examples
//!
//! ## A pool over a `static` array
//!
//! ```
//! use slot_pool::{InterruptSection, SlotPool, SlotStorage};
//!
//! #[derive(Clone, Copy)]
//! struct Frame {
//!     len: u8,
//!     payload: [u8; 127],
//! }
//!
//! static FRAMES: SlotStorage<Frame, 8> = SlotStorage::new();
//!
//! let pool = SlotPool::new(FRAMES.take().unwrap(), InterruptSection);
//!
//! let mut rx = pool.alloc().expect("no receive buffer available");
//! let frame = rx.write(Frame {
//!     len: 3,
//!     payload: [0; 127],
//! });
//! frame.payload[..3].copy_from_slice(b"ack");
//! pool.free(rx);
//! ```
//!
//! ## A pool over raw memory
//!
//! ```
//! use slot_pool::{InterruptSection, SlotPool};
//!
//! let mut memory = [0u64; 32];
//! let pool = unsafe {
//!     SlotPool::<[u8; 60], _>::from_raw_parts(
//!         memory.as_mut_ptr().cast(),
//!         size_of_val(&memory),
//!         InterruptSection,
//!     )
//! };
//! // 256 bytes hold four 61-byte slots; the last 12 bytes stay unused.
//! assert_eq!(pool.capacity(), 4);
//! ```
//!
//! # Errors
//!
//! Running out of slots is expected and shows up as `None`. Misuse of the
//! pool, such as freeing a handle issued by another pool, is a bug and
//! panics; see [`ContractViolation`].
//!
//! # Logging
//!
//! Install a [`Logger`](log::Logger) with [`log::set_logger`] to see pool
//! initialization, contention retries, exhaustion, and contract violations.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[macro_use]
pub mod log;

pub mod critical_section;
mod error;
mod handle;
mod pool;
mod slot;

pub use self::{
    critical_section::{
        CriticalSection, InterruptSection, NoSection, SpinSection, SpinSectionGuard,
    },
    error::ContractViolation,
    handle::SlotHandle,
    pool::SlotPool,
    slot::{Slot, SlotStorage},
};

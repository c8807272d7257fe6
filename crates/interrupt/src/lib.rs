//! Local interrupt masking for the current hardware thread.
//!
//! [`disable`] saves the interrupt-enable state, masks interrupts, and hands
//! back a [`Guard`]. Dropping the guard restores exactly the state that was
//! saved, so guards nest: an interrupt handler that takes a guard while the
//! interrupted code already holds one leaves interrupts masked on exit, and
//! only the outermost guard turns them back on.
//!
//! ```no_run
//! let outer = interrupt::disable();
//! assert!(!interrupt::is_enabled());
//! {
//!     let _inner = interrupt::disable();
//!     assert!(!interrupt::is_enabled());
//! }
//! assert!(!interrupt::is_enabled());
//! drop(outer);
//! assert!(interrupt::is_enabled());
//! ```
//!
//! # Backends
//!
//! - RISC-V bare metal: `mstatus.MIE` (or `sstatus.SIE` with the `supervisor`
//!   feature), cleared atomically with `csrrci`.
//! - Cortex-M bare metal: PRIMASK, saved and then set with `cpsid i`.
//! - Hosted (`std` feature): a per-thread emulated enable bit, so tests can
//!   exercise the same nesting rules.
//! - Anything else panics with "unsupported architecture".

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use core::marker::PhantomData;

cfg_if::cfg_if! {
    if #[cfg(all(any(target_arch = "riscv32", target_arch = "riscv64"), target_os = "none"))] {
        #[path = "imp/riscv.rs"]
        mod imp;
    } else if #[cfg(all(target_arch = "arm", target_os = "none"))] {
        #[path = "imp/cortex_m.rs"]
        mod imp;
    } else if #[cfg(any(test, feature = "std"))] {
        #[path = "imp/hosted.rs"]
        mod imp;
    } else {
        #[path = "imp/unsupported.rs"]
        mod imp;
    }
}

/// Masks interrupts on the current hardware thread until the returned guard
/// is dropped.
#[must_use = "interrupts are restored as soon as the guard is dropped"]
pub fn disable() -> Guard {
    let saved = imp::read_and_disable();
    Guard {
        saved,
        _not_send: PhantomData,
    }
}

/// Returns `true` if interrupts are currently enabled on this hardware thread.
#[must_use]
pub fn is_enabled() -> bool {
    imp::is_enabled()
}

/// Restores the saved interrupt-enable state when dropped.
///
/// The guard is tied to the hardware thread that created it and therefore is
/// neither `Send` nor `Sync`.
#[derive(Debug)]
pub struct Guard {
    saved: imp::State,
    _not_send: PhantomData<*mut ()>,
}

impl Guard {
    /// Returns `true` if interrupts were enabled when this guard was taken,
    /// that is, if this is the outermost guard.
    #[must_use]
    pub fn was_enabled(&self) -> bool {
        self.saved.enabled()
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        imp::restore(self.saved);
    }
}

//! Critical sections guarding slot occupancy flags.
//!
//! A [`CriticalSection`] excludes every other context that could touch the
//! same pool for as long as its guard lives. The pool holds a guard only
//! around the check-and-set of a single flag, and releases it on every path
//! by dropping the guard.
//!
//! Three sections are provided:
//!
//! - [`InterruptSection`] masks interrupts on the current hardware thread.
//!   This is all a single-core device needs, since the only thing that can
//!   run in between is an interrupt handler.
//! - [`SpinSection`] additionally takes a spin lock, for pools shared between
//!   cores.
//! - [`NoSection`] does nothing, for pools that are never touched from an
//!   interrupt handler.

use core::{
    fmt, hint,
    sync::atomic::{AtomicBool, Ordering},
};

/// An exclusive region entered by taking a guard and left by dropping it.
///
/// Entering must be possible from any context, including an interrupt
/// handler that preempted another holder of the same section, and must not
/// suspend.
pub trait CriticalSection {
    type Guard<'a>
    where
        Self: 'a;

    fn enter(&self) -> Self::Guard<'_>;
}

impl<S> CriticalSection for &S
where
    S: CriticalSection + ?Sized,
{
    type Guard<'a>
        = S::Guard<'a>
    where
        Self: 'a;

    fn enter(&self) -> Self::Guard<'_> {
        S::enter(self)
    }
}

/// Masks interrupts on the current hardware thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptSection;

impl CriticalSection for InterruptSection {
    type Guard<'a> = interrupt::Guard;

    fn enter(&self) -> interrupt::Guard {
        interrupt::disable()
    }
}

/// An empty section for pools used from a single priority level only.
///
/// Interrupts stay enabled while a flag is updated. Sharing such a pool with
/// an interrupt handler is only sound on targets with byte-sized
/// compare-and-swap.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoSection;

impl CriticalSection for NoSection {
    type Guard<'a> = ();

    fn enter(&self) {}
}

/// Masks interrupts, then spins until no other core holds the section.
pub struct SpinSection {
    locked: AtomicBool,
}

impl Default for SpinSection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpinSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinSection")
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl SpinSection {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl CriticalSection for SpinSection {
    type Guard<'a> = SpinSectionGuard<'a>;

    fn enter(&self) -> SpinSectionGuard<'_> {
        let interrupt_guard = interrupt::disable();

        while self.locked.swap(true, Ordering::Acquire) {
            hint::spin_loop();
        }

        SpinSectionGuard {
            section: self,
            _interrupt_guard: interrupt_guard,
        }
    }
}

/// Leaves a [`SpinSection`] when dropped.
///
/// The lock is released before interrupts are restored.
pub struct SpinSectionGuard<'a> {
    section: &'a SpinSection,
    _interrupt_guard: interrupt::Guard,
}

impl fmt::Debug for SpinSectionGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinSectionGuard").finish_non_exhaustive()
    }
}

impl Drop for SpinSectionGuard<'_> {
    fn drop(&mut self) {
        assert!(
            self.section.is_locked(),
            "SpinSectionGuard dropped without holding the lock"
        );
        self.section.locked.store(false, Ordering::Release);
    }
}

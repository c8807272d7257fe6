use cortex_m::{interrupt, register::primask};

#[derive(Debug, Clone, Copy)]
pub struct State {
    enabled: bool,
}

impl State {
    pub fn enabled(self) -> bool {
        self.enabled
    }
}

pub fn read_and_disable() -> State {
    // A handler that runs between the read and `cpsid` restores PRIMASK
    // before returning, so the value read is still current.
    let enabled = primask::read().is_active();
    interrupt::disable();
    State { enabled }
}

pub fn is_enabled() -> bool {
    primask::read().is_active()
}

pub fn restore(state: State) {
    assert!(
        !is_enabled(),
        "restoring interrupt state with interrupts enabled"
    );
    if state.enabled {
        unsafe {
            interrupt::enable();
        }
    }
}

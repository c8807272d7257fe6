use std::cell::Cell;

std::thread_local! {
    static ENABLED: Cell<bool> = const { Cell::new(true) };
}

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
    State {
        enabled: ENABLED.replace(false),
    }
}

pub fn is_enabled() -> bool {
    ENABLED.get()
}

pub fn restore(state: State) {
    assert!(
        !is_enabled(),
        "restoring interrupt state with interrupts enabled"
    );
    if state.enabled {
        ENABLED.set(true);
    }
}

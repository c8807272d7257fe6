use core::arch::asm;

#[derive(Debug, Clone, Copy)]
pub struct State {
    enabled: bool,
}

impl State {
    pub fn enabled(self) -> bool {
        self.enabled
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "supervisor")] {
        use riscv::register::sstatus;

        const SSTATUS_SIE: usize = 0b10;

        pub fn read_and_disable() -> State {
            let sstatus: usize;
            unsafe {
                asm!(
                    "csrrci {rd}, sstatus, {sstatus_sie}",
                    rd = out(reg) sstatus,
                    sstatus_sie = const SSTATUS_SIE,
                    options(preserves_flags, nostack)
                );
            }
            State {
                enabled: (sstatus & SSTATUS_SIE) != 0,
            }
        }

        pub fn is_enabled() -> bool {
            sstatus::read().sie()
        }

        fn enable() {
            unsafe {
                sstatus::set_sie();
            }
        }
    } else {
        use riscv::register::mstatus;

        const MSTATUS_MIE: usize = 0b1000;

        pub fn read_and_disable() -> State {
            let mstatus: usize;
            unsafe {
                asm!(
                    "csrrci {rd}, mstatus, {mstatus_mie}",
                    rd = out(reg) mstatus,
                    mstatus_mie = const MSTATUS_MIE,
                    options(preserves_flags, nostack)
                );
            }
            State {
                enabled: (mstatus & MSTATUS_MIE) != 0,
            }
        }

        pub fn is_enabled() -> bool {
            mstatus::read().mie()
        }

        fn enable() {
            unsafe {
                mstatus::set_mie();
            }
        }
    }
}

pub fn restore(state: State) {
    assert!(
        !is_enabled(),
        "restoring interrupt state with interrupts enabled"
    );
    if state.enabled {
        enable();
    }
}

use snafu::Snafu;

/// A misuse of the pool by its caller.
///
/// These are bugs, not runtime conditions: the operations that detect them
/// panic through [`report`] rather than returning them, except for
/// [`SlotPool::try_from_raw_parts`](crate::SlotPool::try_from_raw_parts).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum ContractViolation {
    #[snafu(display("slot memory is null but its size holds {capacity} slots"))]
    NullMemory { capacity: usize },

    #[snafu(display("slot memory at {address:#x} is not aligned to {align} bytes"))]
    MisalignedMemory { address: usize, align: usize },

    #[snafu(display("slot index {index} is out of range for a pool of {capacity} slots"))]
    IndexOutOfRange { index: usize, capacity: usize },

    #[snafu(display("handle for slot {index} at {address:#x} was not issued by this pool"))]
    ForeignHandle { index: usize, address: usize },

    #[snafu(display("pointer {address:#x} lies below the first slot at {base:#x}"))]
    PointerBelowBase { address: usize, base: usize },

    #[snafu(display("pointer {address:#x} is {offset} bytes past the start of slot {index}"))]
    InteriorPointer {
        address: usize,
        index: usize,
        offset: usize,
    },

    #[snafu(display("slot {index} is not allocated"))]
    NotTaken { index: usize },
}

#[track_caller]
pub(crate) fn report(err: ContractViolation) -> ! {
    error!("slot pool contract violation: {err}");
    panic!("slot pool contract violation: {err}");
}

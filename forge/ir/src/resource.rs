//! Shared stateful resources and the operations that access them.
use crate::HolderIdx;
use forge_utils::{GetName, Id};

/// The flavor of hardware behind a [StateHolder].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HolderKind {
    /// A memory bank.
    Memory,
    Register,
    /// A FIFO interface.
    Fifo,
    /// An external pin.
    Pin,
}

/// Identity of one shared, stateful resource. Many accessors may refer to the
/// same holder; holders live as long as the design.
#[derive(Debug, Clone)]
pub struct StateHolder {
    pub name: Id,
    pub kind: HolderKind,
}

impl GetName for StateHolder {
    fn name(&self) -> Id {
        self.name
    }
}

/// The operation an accessor performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    MemoryRead,
    MemoryWrite,
    RegisterRead,
    RegisterWrite,
    FifoRead,
    FifoWrite,
    /// A peek or status query of a FIFO.
    FifoAccess,
    /// Any access to an external pin.
    PinAccess,
}

impl AccessKind {
    /// Kind of resource this access is legal against.
    pub fn holder_kind(&self) -> HolderKind {
        match self {
            AccessKind::MemoryRead | AccessKind::MemoryWrite => {
                HolderKind::Memory
            }
            AccessKind::RegisterRead | AccessKind::RegisterWrite => {
                HolderKind::Register
            }
            AccessKind::FifoRead
            | AccessKind::FifoWrite
            | AccessKind::FifoAccess => HolderKind::Fifo,
            AccessKind::PinAccess => HolderKind::Pin,
        }
    }

    /// Whether the access produces a data result.
    pub fn has_result(&self) -> bool {
        !matches!(self, AccessKind::MemoryWrite | AccessKind::RegisterWrite)
    }

    /// Number of data inputs the access consumes.
    pub fn num_data_ports(&self) -> usize {
        match self {
            // address
            AccessKind::MemoryRead => 1,
            // address and value
            AccessKind::MemoryWrite => 2,
            AccessKind::RegisterWrite
            | AccessKind::FifoWrite
            | AccessKind::PinAccess => 1,
            AccessKind::RegisterRead
            | AccessKind::FifoRead
            | AccessKind::FifoAccess => 0,
        }
    }
}

/// Payload of an accessor component: one access to exactly one holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Access {
    pub kind: AccessKind,
    pub holder: HolderIdx,
}

impl Access {
    pub fn new(kind: AccessKind, holder: HolderIdx) -> Self {
        Self { kind, holder }
    }

    /// The resource this access targets.
    pub fn resource(&self) -> HolderIdx {
        self.holder
    }

    /// True when the access may not be reordered with any other access of
    /// the same resource. Only register reads are free of this: any number
    /// of them may run unordered ahead of the first write.
    pub fn is_sequencing_point(&self) -> bool {
        !matches!(self.kind, AccessKind::RegisterRead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_register_reads_are_unordered() {
        let holder = HolderIdx::from(0_u32);
        let reads = Access::new(AccessKind::RegisterRead, holder);
        assert!(!reads.is_sequencing_point());
        for kind in [
            AccessKind::MemoryRead,
            AccessKind::MemoryWrite,
            AccessKind::RegisterWrite,
            AccessKind::FifoRead,
            AccessKind::FifoWrite,
            AccessKind::FifoAccess,
            AccessKind::PinAccess,
        ] {
            assert!(
                Access::new(kind, holder).is_sequencing_point(),
                "{kind:?}"
            );
        }
    }
}

use crate::{Access, CompIdx, Entry, Exit, PortIdx, TaskIdx};
use forge_utils::{GetName, Id};
use smallvec::SmallVec;

/// Stateless operations. Only the distinctions the scheduler cares about are
/// kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// A constant value.
    Constant(u64),
    /// A width or sign conversion that forwards its single input.
    Cast,
    /// Any other combinational operation.
    Logic,
    /// Stall logic inserted by the scheduler in front of a process start.
    Stallboard,
}

/// The parts of an if-then-else.
#[derive(Debug, Clone)]
pub struct Branch {
    /// Computes the condition.
    pub decision: CompIdx,
    pub true_branch: CompIdx,
    pub false_branch: CompIdx,
    /// Components owned by the branch that belong to neither arm.
    pub components: Vec<CompIdx>,
}

/// What a component is. Modules (components with children) are `Block`,
/// `Loop` and `Branch`.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    /// An access to a state holder.
    Access(Access),
    Op(OpKind),
    /// A sequence of child components ordered by their dependencies.
    Block(Vec<CompIdx>),
    /// A loop whose body is a block.
    Loop { body: CompIdx },
    Branch(Branch),
    /// A call of a task; the callee body is not a child of the call.
    TaskCall(TaskIdx),
}

/// A node of the design graph.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: Id,
    pub kind: ComponentKind,
    /// The module that directly contains this component. `None` for task
    /// bodies.
    pub owner: Option<CompIdx>,
    /// Control enable.
    pub go: PortIdx,
    pub data_ports: SmallVec<[PortIdx; 2]>,
    pub entries: Vec<Entry>,
    pub exits: Vec<Exit>,
}

impl Component {
    pub fn is_module(&self) -> bool {
        matches!(
            self.kind,
            ComponentKind::Block(_)
                | ComponentKind::Loop { .. }
                | ComponentKind::Branch(_)
        )
    }

    /// Returns the access performed by this component, if it is an accessor.
    pub fn as_access(&self) -> Option<&Access> {
        if let ComponentKind::Access(access) = &self.kind {
            Some(access)
        } else {
            None
        }
    }

    pub fn is_op(&self, op: OpKind) -> bool {
        matches!(self.kind, ComponentKind::Op(kind) if kind == op)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ComponentKind::Op(OpKind::Constant(_)))
    }

    /// Direct children of a module in declaration order; empty for leaves.
    pub fn children(&self) -> Vec<CompIdx> {
        match &self.kind {
            ComponentKind::Block(comps) => comps.clone(),
            ComponentKind::Loop { body } => vec![*body],
            ComponentKind::Branch(branch) => {
                let mut out = vec![
                    branch.decision,
                    branch.true_branch,
                    branch.false_branch,
                ];
                out.extend(branch.components.iter().copied());
                out
            }
            ComponentKind::Access(_)
            | ComponentKind::Op(_)
            | ComponentKind::TaskCall(_) => vec![],
        }
    }

    /// Every input port, go port first.
    pub fn ports(&self) -> impl Iterator<Item = PortIdx> + '_ {
        std::iter::once(self.go).chain(self.data_ports.iter().copied())
    }

    /// A short tag describing the kind, used when printing.
    pub fn kind_str(&self) -> &'static str {
        match &self.kind {
            ComponentKind::Access(access) => match access.kind {
                crate::AccessKind::MemoryRead => "mem_read",
                crate::AccessKind::MemoryWrite => "mem_write",
                crate::AccessKind::RegisterRead => "reg_read",
                crate::AccessKind::RegisterWrite => "reg_write",
                crate::AccessKind::FifoRead => "fifo_read",
                crate::AccessKind::FifoWrite => "fifo_write",
                crate::AccessKind::FifoAccess => "fifo_access",
                crate::AccessKind::PinAccess => "pin_access",
            },
            ComponentKind::Op(OpKind::Constant(_)) => "const",
            ComponentKind::Op(OpKind::Cast) => "cast",
            ComponentKind::Op(OpKind::Logic) => "logic",
            ComponentKind::Op(OpKind::Stallboard) => "stallboard",
            ComponentKind::Block(_) => "block",
            ComponentKind::Loop { .. } => "loop",
            ComponentKind::Branch(_) => "branch",
            ComponentKind::TaskCall(_) => "call",
        }
    }
}

impl GetName for Component {
    fn name(&self) -> Id {
        self.name
    }
}

/// A callable unit of the design.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: Id,
    /// The block executed by a call of this task.
    pub body: CompIdx,
}

impl GetName for Task {
    fn name(&self) -> Id {
        self.name
    }
}

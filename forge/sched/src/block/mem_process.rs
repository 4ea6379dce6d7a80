use forge_idx::{impl_index, maps::IndexedMap};
use forge_ir::{self as ir, CompIdx, ComponentKind, HolderIdx};
use forge_utils::{Error, ForgeResult};
use itertools::Itertools;
use linked_hash_map::LinkedHashMap;
use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
};

/// Handle to a [MemProcess] in a [ProcessTable].
#[derive(Debug, Eq, Copy, Clone, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProcessIdx(u32);
impl_index!(ProcessIdx);

/// Every process identified in a design.
pub type ProcessTable = IndexedMap<ProcessIdx, MemProcess>;

/// Stall logic created by the scheduler at the start of a process. Wraps the
/// [ir::OpKind::Stallboard] component that implements it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StallBoard(CompIdx);

impl StallBoard {
    /// Fails unless `comp` is a stallboard of `design`.
    pub fn new(design: &ir::Design, comp: CompIdx) -> ForgeResult<Self> {
        match design.get_component(comp) {
            Some(c) if c.is_op(ir::OpKind::Stallboard) => Ok(StallBoard(comp)),
            Some(_) => Err(Error::invalid_argument(format!(
                "`{}` is not a stallboard",
                ir::Printer::component_to_str(design, comp)
            ))),
            None => Err(Error::invalid_argument(format!(
                "Stallboard {comp:?} does not belong to the design"
            ))),
        }
    }

    pub fn component(&self) -> CompIdx {
        self.0
    }
}

/// The serialization region of one state holder: the accessors that may
/// start it and the accessors that may end it.
///
/// A process is scheduled in its *context*, the innermost block that
/// contains all of its accessors. Within the context, each accessor is
/// represented by its *critical context*: the child of the context that
/// contains it. Start and end points are critical contexts, so the tracker
/// of the context module sees the nested loop or the task call that performs
/// the access. The endpoints are fixed at construction; only the stall
/// points are filled in later, by the scheduler.
#[derive(Debug)]
pub struct MemProcess {
    holder: HolderIdx,
    starts: BTreeSet<CompIdx>,
    ends: BTreeSet<CompIdx>,
    context: CompIdx,
    start_points: BTreeSet<CompIdx>,
    end_points: BTreeSet<CompIdx>,
    /// Keyed by start point.
    stall_points: RefCell<LinkedHashMap<CompIdx, StallBoard>>,
}

impl MemProcess {
    /// Both endpoint sets must be non-empty and share an enclosing block.
    pub fn new(
        design: &ir::Design,
        holder: HolderIdx,
        starts: BTreeSet<CompIdx>,
        ends: BTreeSet<CompIdx>,
    ) -> Self {
        assert!(
            !starts.is_empty(),
            "No valid start point found for process of {holder:?}"
        );
        assert!(
            !ends.is_empty(),
            "No valid end point found for process of {holder:?}"
        );
        // Owner chains, outermost first, ending at the accessor.
        let chains: HashMap<CompIdx, Vec<CompIdx>> = starts
            .iter()
            .chain(&ends)
            .map(|comp| {
                let mut chain = design.owners(*comp).collect_vec();
                chain.reverse();
                chain.push(*comp);
                (*comp, chain)
            })
            .collect();
        let mut shared: Option<&[CompIdx]> = None;
        for chain in chains.values() {
            shared = Some(match shared {
                None => chain.as_slice(),
                Some(prefix) => {
                    let len = prefix
                        .iter()
                        .zip(chain)
                        .take_while(|(a, b)| a == b)
                        .count();
                    &prefix[..len]
                }
            });
        }
        let shared = shared.unwrap_or_default();
        let Some(depth) = shared.iter().rposition(|comp| {
            matches!(design.component(*comp).kind, ComponentKind::Block(_))
        }) else {
            panic!(
                "No context for process of `{}`",
                design.holder(holder).name
            );
        };
        let critical = |comps: &BTreeSet<CompIdx>| -> BTreeSet<CompIdx> {
            comps.iter().map(|comp| chains[comp][depth + 1]).collect()
        };
        Self {
            holder,
            context: shared[depth],
            start_points: critical(&starts),
            end_points: critical(&ends),
            starts,
            ends,
            stall_points: RefCell::default(),
        }
    }

    /// The resource whose accesses this process orders.
    pub fn holder(&self) -> HolderIdx {
        self.holder
    }

    /// The accessors that open the process.
    pub fn starts(&self) -> &BTreeSet<CompIdx> {
        &self.starts
    }

    /// The accessors that close the process.
    pub fn ends(&self) -> &BTreeSet<CompIdx> {
        &self.ends
    }

    /// The innermost block containing every accessor of the process.
    pub fn context(&self) -> CompIdx {
        self.context
    }

    pub fn start_points(&self) -> &BTreeSet<CompIdx> {
        &self.start_points
    }

    pub fn end_points(&self) -> &BTreeSet<CompIdx> {
        &self.end_points
    }

    /// Whether `comp` is the child of the context that opens the process.
    pub fn is_start_point(&self, comp: CompIdx) -> bool {
        self.start_points.contains(&comp)
    }

    /// Whether `comp` is the child of the context that closes the process.
    pub fn is_end_point(&self, comp: CompIdx) -> bool {
        self.end_points.contains(&comp)
    }

    /// Attach the stall logic generated for start point `comp`.
    pub fn set_stall_point(
        &self,
        comp: CompIdx,
        board: StallBoard,
    ) -> ForgeResult<()> {
        if !self.is_start_point(comp) {
            return Err(Error::invalid_argument(format!(
                "{comp:?} is not a start point of the process of {:?}",
                self.holder
            )));
        }
        self.stall_points.borrow_mut().insert(comp, board);
        Ok(())
    }

    pub fn stall_point(&self, comp: CompIdx) -> Option<StallBoard> {
        self.stall_points.borrow().get(&comp).copied()
    }

    /// Stall points registered so far, in registration order.
    pub fn stall_points(&self) -> Vec<(CompIdx, StallBoard)> {
        self.stall_points
            .borrow()
            .iter()
            .map(|(c, b)| (*c, *b))
            .collect()
    }

    /// Human readable form naming the resource, both endpoint sets and the
    /// context.
    pub fn to_str(&self, design: &ir::Design) -> String {
        format!(
            "process({}) start: {} end: {} in {}",
            design.holder(self.holder).name,
            ir::Printer::component_set_to_str(design, &self.starts),
            ir::Printer::component_set_to_str(design, &self.ends),
            design.component(self.context).name
        )
    }
}

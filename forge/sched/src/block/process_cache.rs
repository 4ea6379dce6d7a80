use super::{
    MemProcess, ProcessIdentifier, ProcessIdx, ProcessTable, ProcessTracker,
    StallBoard,
};
use crate::traversal::{ConstructOpts, Named};
use forge_ir::{self as ir, CompIdx, Id};
use forge_utils::{Error, ForgeResult};
use itertools::Itertools;
use std::{
    collections::{HashMap, hash_map},
    rc::Rc,
};

/// Options of the block scheduling analysis.
pub struct BlockSchedule;

impl Named for BlockSchedule {
    fn name() -> &'static str {
        "block-schedule"
    }

    fn description() -> &'static str {
        "identify the resource access processes that the scheduler serializes"
    }

    fn opts() -> &'static [(&'static str, &'static str)] {
        &[(
            "disable",
            "skip process identification and schedule every access serially",
        )]
    }
}

impl ConstructOpts for BlockSchedule {}

impl BlockSchedule {
    /// Whether process identification runs for `design`.
    pub fn enabled(design: &ir::Design) -> bool {
        !Self::get_opts(design)[0]
    }
}

/// Owns the processes of a design and the trackers of the modules being
/// scheduled.
///
/// Each module gets at most one tracker, created on first request. Once the
/// scheduler is done with a module it deletes the tracker; asking for it
/// again is an error and deleting it twice is a bug.
#[derive(Debug)]
pub struct ProcessCache {
    processes: Rc<ProcessTable>,
    trackers: HashMap<CompIdx, ProcessTracker>,
    /// Names of the modules whose trackers were deleted.
    deleted: HashMap<CompIdx, Id>,
}

impl ProcessCache {
    /// Identifies the processes of every task of `design`, each in the scope
    /// of its own body. With `enabled` unset no process is identified.
    pub fn new(design: &ir::Design, enabled: bool) -> ForgeResult<Self> {
        let mut processes = ProcessTable::new();
        if enabled {
            for (_, task) in design.tasks() {
                let found =
                    ProcessIdentifier::generate_processes(design, task.body)?;
                for (_, proc) in found.into_iter().sorted_by_key(|(h, _)| *h)
                {
                    processes.push(proc);
                }
            }
            log::info!("Identified {} processes", processes.len());
        } else {
            log::info!("Block scheduling disabled, no processes identified");
        }
        Ok(Self {
            processes: Rc::new(processes),
            trackers: HashMap::new(),
            deleted: HashMap::new(),
        })
    }

    /// Like [ProcessCache::new], enabled unless `block-schedule:disable` was
    /// passed.
    pub fn from_opts(design: &ir::Design) -> ForgeResult<Self> {
        Self::new(design, BlockSchedule::enabled(design))
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn process(&self, idx: ProcessIdx) -> &MemProcess {
        &self.processes[idx]
    }

    /// Whether `comp` starts any process in the module that owns it.
    pub fn is_critical_start_point(
        &self,
        design: &ir::Design,
        comp: CompIdx,
    ) -> ForgeResult<bool> {
        Self::check_component(design, comp)?;
        Ok(self.processes.values().any(|proc| proc.is_start_point(comp)))
    }

    /// Attach `board` as the stall point of every process started by
    /// `comp`.
    pub fn register_start_point(
        &self,
        design: &ir::Design,
        comp: CompIdx,
        board: CompIdx,
    ) -> ForgeResult<()> {
        Self::check_component(design, comp)?;
        let board = StallBoard::new(design, board)?;
        for proc in self.processes.values() {
            if proc.is_start_point(comp) {
                proc.set_stall_point(comp, board)?;
            }
        }
        Ok(())
    }

    /// The tracker of `module`, created on first request.
    pub fn get_tracker(
        &mut self,
        design: &ir::Design,
        module: CompIdx,
    ) -> ForgeResult<&ProcessTracker> {
        if let Some(name) = self.deleted.get(&module) {
            return Err(Error::invalid_argument(format!(
                "Tracker for module `{name}` was already deleted"
            )));
        }
        let tracker: &ProcessTracker = match self.trackers.entry(module) {
            hash_map::Entry::Occupied(entry) => entry.into_mut(),
            hash_map::Entry::Vacant(entry) => {
                let tracker = ProcessTracker::new(
                    design,
                    module,
                    Rc::clone(&self.processes),
                )?;
                log::debug!("Created tracker for module `{}`", tracker.name());
                entry.insert(tracker)
            }
        };
        Ok(tracker)
    }

    /// Forget the tracker of `module`.
    ///
    /// # Panics
    /// When `module` has no live tracker.
    pub fn delete_tracker(&mut self, module: CompIdx) {
        match self.trackers.remove(&module) {
            Some(tracker) => {
                log::debug!("Deleted tracker for module `{}`", tracker.name());
                self.deleted.insert(module, tracker.name());
            }
            None => match self.deleted.get(&module) {
                Some(name) => {
                    panic!("Tracker for module `{name}` was deleted twice")
                }
                None => panic!("No tracker exists for module {module:?}"),
            },
        }
    }

    fn check_component(design: &ir::Design, comp: CompIdx) -> ForgeResult<()> {
        if design.get_component(comp).is_none() {
            return Err(Error::invalid_argument(format!(
                "{comp:?} is not a component of the design"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_ir::{AccessKind, Builder, Design, HolderKind};

    #[test]
    fn disable_option_is_read_from_design() {
        let mut design = Design::new();
        assert!(BlockSchedule::enabled(&design));
        design.extra_opts.push("block-schedule:disable".to_string());
        assert!(!BlockSchedule::enabled(&design));
        design.extra_opts = vec!["other-pass:disable".to_string()];
        assert!(BlockSchedule::enabled(&design));
    }

    #[test]
    fn processes_of_every_task_are_collected() {
        let mut design = Design::new();
        let mut b = Builder::new(&mut design);
        let mem = b.add_holder("mem", HolderKind::Memory);
        for name in ["a", "c"] {
            let task = b.add_task(name);
            let body = b.body(task);
            let rd = b.add_access(body, "rd", AccessKind::MemoryRead, mem);
            let wr = b.add_access(body, "wr", AccessKind::MemoryWrite, mem);
            b.sequence(rd, wr);
        }
        let cache = ProcessCache::new(&design, true).unwrap();
        assert_eq!(cache.processes().len(), 2);
        let cache = ProcessCache::new(&design, false).unwrap();
        assert!(cache.processes().is_empty());
    }

    #[test]
    fn absent_components_are_invalid_arguments() {
        let design = Design::new();
        let mut cache = ProcessCache::new(&design, true).unwrap();
        let missing = CompIdx::from(7_u32);
        assert!(cache.is_critical_start_point(&design, missing).is_err());
        assert!(cache.register_start_point(&design, missing, missing).is_err());
        assert!(cache.get_tracker(&design, missing).is_err());
    }
}

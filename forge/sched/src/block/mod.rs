//! Process-based block scheduling support.
//!
//! A *process* is the region between the first and the last accesses of one
//! [StateHolder](forge_ir::StateHolder) inside a task. The scheduler
//! serializes accesses within a process by placing a stallboard at each start
//! point and feeding it the completion signals collected by the
//! [ProcessTracker] of each module.
mod component_process_deriver;
mod mem_process;
mod process_cache;
mod process_identifier;
mod process_tracker;

pub use component_process_deriver::ComponentProcessDeriver;
pub use mem_process::{MemProcess, ProcessIdx, ProcessTable, StallBoard};
pub use process_cache::{BlockSchedule, ProcessCache};
pub use process_identifier::ProcessIdentifier;
pub use process_tracker::{ModuleStallSource, ProcessTracker};

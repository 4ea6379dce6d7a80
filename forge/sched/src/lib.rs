//! Scheduling analyses for forge designs.
//!
//! When several operations of a design share one stateful resource (a memory
//! bank, a register, a FIFO or a pin) the generated hardware must perform
//! those accesses in program order even though the operations are otherwise
//! free to run concurrently. The [block] module finds, for every resource,
//! the span of accesses that must be serialized (a *process*) and classifies
//! every component against those processes so that the scheduler knows
//! where to place stall logic.
//!
//! ```rust
//! use forge_ir::{self as ir, AccessKind, HolderKind};
//! use forge_sched::block::ProcessCache;
//! use forge_utils::ForgeResult;
//!
//! fn main() -> ForgeResult<()> {
//!     let mut design = ir::Design::new();
//!     let mut b = ir::Builder::new(&mut design);
//!     let mem = b.add_holder("mem", HolderKind::Memory);
//!     let body = { let t = b.add_task("main"); b.body(t) };
//!     let rd = b.add_access(body, "rd", AccessKind::MemoryRead, mem);
//!     let wr = b.add_access(body, "wr", AccessKind::MemoryWrite, mem);
//!     b.sequence(rd, wr);
//!
//!     let mut cache = ProcessCache::new(&design, true)?;
//!     assert_eq!(cache.processes().len(), 1);
//!     assert!(cache.is_critical_start_point(&design, rd)?);
//!     let tracker = cache.get_tracker(&design, body)?;
//!     let proc = tracker.processes().keys().next().unwrap();
//!     assert_eq!(tracker.stall_signals(proc).collect::<Vec<_>>(), vec![wr]);
//!     cache.delete_tracker(body);
//!     Ok(())
//! }
//! ```
pub mod block;
pub mod traversal;

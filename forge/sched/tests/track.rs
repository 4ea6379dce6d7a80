use forge_ir::{
    AccessKind, Builder, CompIdx, Design, HolderIdx, HolderKind, OpKind,
};
use forge_sched::block::{
    ComponentProcessDeriver, ModuleStallSource, ProcessCache, ProcessIdx,
    ProcessTracker,
};
use std::collections::BTreeSet;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `rd` then `last` on one memory, with `sum` consuming the value read by
/// `last`.
struct ReadChain {
    design: Design,
    mem: HolderIdx,
    body: CompIdx,
    rd: CompIdx,
    last: CompIdx,
    sum: CompIdx,
}

fn read_chain() -> ReadChain {
    let mut design = Design::new();
    let mut b = Builder::new(&mut design);
    let mem = b.add_holder("mem", HolderKind::Memory);
    let task = b.add_task("main");
    let body = b.body(task);
    let rd = b.add_access(body, "rd", AccessKind::MemoryRead, mem);
    let last = b.add_access(body, "last", AccessKind::MemoryRead, mem);
    let sum = b.add_op(body, "sum", OpKind::Logic, 1);
    b.sequence(rd, last);
    b.feed(last, 0, sum, 0);
    ReadChain {
        design,
        mem,
        body,
        rd,
        last,
        sum,
    }
}

fn only_process(cache: &ProcessCache) -> ProcessIdx {
    let keys: Vec<_> = cache.processes().keys().collect();
    assert_eq!(keys.len(), 1);
    keys[0]
}

#[test]
fn data_consumers_inherit_processes() {
    init_logger();
    let ReadChain {
        design,
        mem,
        body,
        rd,
        last,
        sum,
    } = read_chain();
    let mut cache = ProcessCache::new(&design, true).unwrap();
    let proc = only_process(&cache);
    assert_eq!(cache.process(proc).holder(), mem);
    let tracker = cache.get_tracker(&design, body).unwrap();

    let derived = ComponentProcessDeriver::new(&design, sum, tracker).unwrap();
    assert_eq!(derived.in_processes(), BTreeSet::from([proc]));
    assert_eq!(derived.data_procs_to_stall(), &BTreeSet::from([proc]));
    assert!(derived.closed_processes().is_empty());
    assert!(derived.uncontrolled_open_procs().is_empty());
    assert!(derived.uncontrolled_data_ports().is_empty());

    let derived = ComponentProcessDeriver::new(&design, last, tracker).unwrap();
    assert_eq!(derived.closed_processes(), &BTreeSet::from([proc]));
    assert!(derived.in_processes().is_empty());

    assert_eq!(
        tracker.stall_signals(proc).collect::<BTreeSet<_>>(),
        BTreeSet::from([last, sum])
    );
    assert!(!tracker.stall_signals(proc).any(|c| c == rd));
}

#[test]
fn uncontrolled_open_stalls_the_module() {
    init_logger();
    let ReadChain {
        mut design,
        body,
        rd,
        ..
    } = read_chain();
    let board = Builder::new(&mut design).add_op(
        body,
        "stall",
        OpKind::Stallboard,
        0,
    );
    let mut cache = ProcessCache::new(&design, true).unwrap();
    let proc = only_process(&cache);
    cache.register_start_point(&design, rd, board).unwrap();
    assert!(cache.register_start_point(&design, rd, rd).is_err());

    let tracker = cache.get_tracker(&design, body).unwrap();
    let derived = ComponentProcessDeriver::new(&design, rd, tracker).unwrap();
    assert_eq!(derived.uncontrolled_open_procs(), BTreeSet::from([proc]));
    assert_eq!(derived.in_processes(), BTreeSet::from([proc]));

    let sources = tracker.module_stall_sources(body);
    assert_eq!(
        sources,
        &[ModuleStallSource::Processes(BTreeSet::from([proc]))]
    );
    assert_eq!(
        sources[0].stalling_components(tracker.processes()),
        BTreeSet::from([board])
    );
    assert!(tracker.module_stall_sources(rd).is_empty());
}

#[test]
fn timed_data_outside_processes_stalls_the_module() {
    init_logger();
    let mut design = Design::new();
    let mut b = Builder::new(&mut design);
    let mem = b.add_holder("mem", HolderKind::Memory);
    let task = b.add_task("main");
    let body = b.body(task);
    let rd = b.add_access(body, "rd", AccessKind::MemoryRead, mem);
    let wr = b.add_access(body, "wr", AccessKind::MemoryWrite, mem);
    let timed = b.add_op(body, "timed", OpKind::Logic, 0);
    let konst = b.add_op(body, "konst", OpKind::Constant(3), 0);
    let cast = b.add_op(body, "cast", OpKind::Cast, 1);
    let step = b.add_op(body, "step", OpKind::Logic, 1);
    let fixed = b.add_op(body, "fixed", OpKind::Logic, 1);
    b.sequence(rd, wr);
    b.sequence(rd, step);
    b.sequence(rd, fixed);
    b.feed(timed, 0, step, 0);
    b.feed(konst, 0, cast, 0);
    b.feed(cast, 0, fixed, 0);
    let step_in = b.data_port(step, 0);

    let mut cache = ProcessCache::new(&design, true).unwrap();
    let tracker = cache.get_tracker(&design, body).unwrap();

    let derived = ComponentProcessDeriver::new(&design, step, tracker).unwrap();
    assert_eq!(derived.uncontrolled_data_ports(), &BTreeSet::from([step_in]));
    let derived =
        ComponentProcessDeriver::new(&design, fixed, tracker).unwrap();
    assert!(derived.uncontrolled_data_ports().is_empty());

    let sources = tracker.module_stall_sources(body);
    assert!(sources.contains(&ModuleStallSource::Component(step)));
    assert!(!sources.contains(&ModuleStallSource::Component(fixed)));
    assert_eq!(
        ModuleStallSource::Component(step)
            .stalling_components(tracker.processes()),
        BTreeSet::from([step])
    );
}

#[test]
fn known_values_need_no_ordering() {
    init_logger();
    let mut design = Design::new();
    let mut b = Builder::new(&mut design);
    let mem = b.add_holder("mem", HolderKind::Memory);
    let task = b.add_task("main");
    let body = b.body(task);
    let rd = b.add_access(body, "rd", AccessKind::MemoryRead, mem);
    let wr = b.add_access(body, "wr", AccessKind::MemoryWrite, mem);
    let folded = b.add_op(body, "folded", OpKind::Logic, 0);
    let step = b.add_op(body, "step", OpKind::Logic, 1);
    b.sequence(rd, wr);
    b.sequence(rd, step);
    b.feed(folded, 0, step, 0);
    let out = b.result(folded, 0);
    b.set_value(out, Some(9));

    let mut cache = ProcessCache::new(&design, true).unwrap();
    let proc = only_process(&cache);
    let tracker = cache.get_tracker(&design, body).unwrap();
    let derived = ComponentProcessDeriver::new(&design, step, tracker).unwrap();
    assert_eq!(derived.in_processes(), BTreeSet::from([proc]));
    assert!(derived.uncontrolled_data_ports().is_empty());
    assert!(
        !tracker
            .module_stall_sources(body)
            .contains(&ModuleStallSource::Component(step))
    );
}

#[test]
fn calls_open_and_close_processes_of_the_caller() {
    init_logger();
    let mut design = Design::new();
    let mut b = Builder::new(&mut design);
    let mem = b.add_holder("mem", HolderKind::Memory);
    let sub = b.add_task("sub");
    let sub_body = b.body(sub);
    let rd = b.add_access(sub_body, "rd", AccessKind::MemoryRead, mem);
    let wr = b.add_access(sub_body, "wr", AccessKind::MemoryWrite, mem);
    b.sequence(rd, wr);
    let main = b.add_task("main");
    let main_body = b.body(main);
    let call = b.add_call(main_body, "call", sub, 0, 0);
    let last = b.add_access(main_body, "last", AccessKind::MemoryWrite, mem);
    let board = b.add_op(main_body, "stall", OpKind::Stallboard, 0);
    b.sequence(call, last);

    let mut cache = ProcessCache::new(&design, true).unwrap();
    let in_context = |cache: &ProcessCache, module: CompIdx| {
        let (idx, _) = cache
            .processes()
            .iter()
            .find(|(_, proc)| proc.context() == module)
            .unwrap();
        idx
    };
    let outer = in_context(&cache, main_body);
    let inner = in_context(&cache, sub_body);
    assert!(cache.is_critical_start_point(&design, call).unwrap());
    cache.register_start_point(&design, call, board).unwrap();
    assert!(cache.process(inner).stall_points().is_empty());

    let tracker = cache.get_tracker(&design, main_body).unwrap();
    let derived = ComponentProcessDeriver::new(&design, call, tracker).unwrap();
    assert_eq!(derived.uncontrolled_open_procs(), BTreeSet::from([outer]));
    let derived = ComponentProcessDeriver::new(&design, last, tracker).unwrap();
    assert_eq!(derived.closed_processes(), &BTreeSet::from([outer]));
    assert_eq!(
        tracker.stall_signals(outer).collect::<BTreeSet<_>>(),
        BTreeSet::from([last])
    );
    assert_eq!(tracker.stall_signals(inner).count(), 0);
    assert_eq!(
        tracker.module_stall_sources(main_body)[0]
            .stalling_components(tracker.processes()),
        BTreeSet::from([board])
    );

    let tracker = cache.get_tracker(&design, sub_body).unwrap();
    let derived = ComponentProcessDeriver::new(&design, rd, tracker).unwrap();
    assert_eq!(derived.uncontrolled_open_procs(), BTreeSet::from([inner]));
    assert_eq!(
        tracker.stall_signals(inner).collect::<BTreeSet<_>>(),
        BTreeSet::from([wr])
    );
}

#[test]
fn nested_end_points_stall_in_the_enclosing_module() {
    init_logger();
    let mut design = Design::new();
    let mut b = Builder::new(&mut design);
    let mem = b.add_holder("mem", HolderKind::Memory);
    let task = b.add_task("main");
    let body = b.body(task);
    let rd = b.add_access(body, "rd", AccessKind::MemoryRead, mem);
    let (lp, lp_body) = b.add_loop(body, "loop");
    let wr = b.add_access(lp_body, "wr", AccessKind::MemoryWrite, mem);
    b.sequence(rd, lp);

    let mut cache = ProcessCache::new(&design, true).unwrap();
    let proc = only_process(&cache);
    assert!(cache.process(proc).is_end_point(lp));
    assert!(!cache.process(proc).is_end_point(wr));

    let tracker = cache.get_tracker(&design, body).unwrap();
    assert_eq!(
        tracker.stall_signals(proc).collect::<BTreeSet<_>>(),
        BTreeSet::from([lp])
    );
    let tracker = cache.get_tracker(&design, lp_body).unwrap();
    assert_eq!(tracker.stall_signals(proc).count(), 0);
    let derived = ComponentProcessDeriver::new(&design, wr, tracker).unwrap();
    assert!(derived.closed_processes().is_empty());
}

#[test]
fn trackers_are_created_once() {
    init_logger();
    let ReadChain { design, body, .. } = read_chain();
    let mut cache = ProcessCache::new(&design, true).unwrap();
    let first: *const ProcessTracker =
        cache.get_tracker(&design, body).unwrap();
    let second: *const ProcessTracker =
        cache.get_tracker(&design, body).unwrap();
    assert!(std::ptr::eq(first, second));
    assert_eq!(cache.get_tracker(&design, body).unwrap().module(), body);

    cache.delete_tracker(body);
    let err = cache.get_tracker(&design, body).unwrap_err();
    assert!(err.to_string().contains("already deleted"), "{err}");
}

#[test]
#[should_panic(expected = "deleted twice")]
fn trackers_are_deleted_once() {
    let ReadChain { design, body, .. } = read_chain();
    let mut cache = ProcessCache::new(&design, true).unwrap();
    cache.get_tracker(&design, body).unwrap();
    cache.delete_tracker(body);
    cache.delete_tracker(body);
}

#[test]
#[should_panic(expected = "No tracker exists")]
fn deleting_an_unknown_tracker_is_a_bug() {
    let ReadChain { design, body, .. } = read_chain();
    let mut cache = ProcessCache::new(&design, true).unwrap();
    cache.delete_tracker(body);
}

#[test]
fn trackers_need_modules() {
    let ReadChain { design, rd, .. } = read_chain();
    let mut cache = ProcessCache::new(&design, true).unwrap();
    let err = cache.get_tracker(&design, rd).unwrap_err();
    assert!(err.to_string().contains("not a module"), "{err}");
}

#[test]
fn disabled_scheduling_classifies_nothing() {
    init_logger();
    let ReadChain { mut design, body, .. } = read_chain();
    design.extra_opts.push("block-schedule:disable".to_string());
    let mut cache = ProcessCache::from_opts(&design).unwrap();
    assert!(cache.processes().is_empty());

    let comps: Vec<_> = design.components().map(|(idx, _)| idx).collect();
    let tracker = cache.get_tracker(&design, body).unwrap();
    for comp in comps {
        let derived =
            ComponentProcessDeriver::new(&design, comp, tracker).unwrap();
        assert!(derived.in_processes().is_empty());
        assert!(derived.closed_processes().is_empty());
        assert!(derived.data_procs_to_stall().is_empty());
        assert!(derived.uncontrolled_open_procs().is_empty());
        assert!(derived.uncontrolled_data_ports().is_empty());
    }
    assert!(tracker.module_stall_sources(body).is_empty());
    assert!(!cache.is_critical_start_point(&design, body).unwrap());
}

#[test]
fn deriving_an_absent_component_fails() {
    let ReadChain { design, body, .. } = read_chain();
    let mut cache = ProcessCache::new(&design, true).unwrap();
    let tracker = cache.get_tracker(&design, body).unwrap();
    let missing = CompIdx::from(1000_u32);
    assert!(ComponentProcessDeriver::new(&design, missing, tracker).is_err());
}

//! IR Builder. Provides convenience methods to build the parts of a design
//! while keeping the back-references (owners, bus dependents) consistent.
use crate::{
    Access, AccessKind, BusIdx, CompIdx, ComponentKind, Dependency,
    DependencyKind, HolderIdx, HolderKind, OpKind, PortIdx, TaskIdx,
    component::{Branch, Component, Task},
    design::Design,
    resource::StateHolder,
    structure::{Bus, BusKind, Entry, Exit, Port, PortKind},
};
use forge_utils::Id;
use smallvec::SmallVec;

/// The handles created by [Builder::add_branch].
#[derive(Debug, Clone, Copy)]
pub struct BranchParts {
    pub branch: CompIdx,
    pub decision: CompIdx,
    pub true_branch: CompIdx,
    pub false_branch: CompIdx,
}

/// IR builder.
/// Every component is created with one go port, one entry, and one exit with
/// a done bus. Misuse (adding children to a leaf, accessing a holder of the
/// wrong kind) is a bug in the caller and panics.
pub struct Builder<'a> {
    pub design: &'a mut Design,
}

impl<'a> Builder<'a> {
    pub fn new(design: &'a mut Design) -> Self {
        Self { design }
    }

    /// Declare a new state holder.
    pub fn add_holder<S: Into<Id>>(
        &mut self,
        name: S,
        kind: HolderKind,
    ) -> HolderIdx {
        let name = self.design.namegen.gen_name(name);
        self.design.holders.push(StateHolder { name, kind })
    }

    /// Construct a new task with an empty body block.
    pub fn add_task<S: Into<Id>>(&mut self, name: S) -> TaskIdx {
        let name: Id = name.into();
        let body = self.new_component(
            format!("{name}_body"),
            ComponentKind::Block(vec![]),
            None,
            0,
            0,
        );
        let name = self.design.namegen.gen_name(name);
        self.design.tasks.push(Task { name, body })
    }

    /// The body block of `task`.
    pub fn body(&self, task: TaskIdx) -> CompIdx {
        self.design.tasks[task].body
    }

    /// Add an empty block to `owner`.
    pub fn add_block<S: Into<Id>>(
        &mut self,
        owner: CompIdx,
        prefix: S,
    ) -> CompIdx {
        let block = self.new_component(
            prefix,
            ComponentKind::Block(vec![]),
            Some(owner),
            0,
            0,
        );
        self.attach(owner, block);
        block
    }

    /// Add a loop to `owner`. Returns the loop and its body block.
    pub fn add_loop<S: Into<Id>>(
        &mut self,
        owner: CompIdx,
        prefix: S,
    ) -> (CompIdx, CompIdx) {
        let prefix: Id = prefix.into();
        let body = self.new_component(
            format!("{prefix}_body"),
            ComponentKind::Block(vec![]),
            None,
            0,
            0,
        );
        let lp = self.new_component(
            prefix,
            ComponentKind::Loop { body },
            Some(owner),
            0,
            0,
        );
        self.design.components[body].owner = Some(lp);
        self.attach(owner, lp);
        (lp, body)
    }

    /// Add an if-then-else to `owner` with an empty decision block and empty
    /// arms.
    pub fn add_branch<S: Into<Id>>(
        &mut self,
        owner: CompIdx,
        prefix: S,
    ) -> BranchParts {
        let prefix: Id = prefix.into();
        let block = |this: &mut Self, suffix: &str| {
            this.new_component(
                format!("{prefix}_{suffix}"),
                ComponentKind::Block(vec![]),
                None,
                0,
                0,
            )
        };
        let decision = block(self, "decision");
        let true_branch = block(self, "true");
        let false_branch = block(self, "false");
        let branch = self.new_component(
            prefix,
            ComponentKind::Branch(Branch {
                decision,
                true_branch,
                false_branch,
                components: vec![],
            }),
            Some(owner),
            0,
            0,
        );
        for part in [decision, true_branch, false_branch] {
            self.design.components[part].owner = Some(branch);
        }
        // The arms run once the condition is known.
        let decided = self.done(decision);
        for arm in [true_branch, false_branch] {
            let go = self.go(arm);
            self.connect(decided, go, DependencyKind::Control);
        }
        self.attach(owner, branch);
        BranchParts {
            branch,
            decision,
            true_branch,
            false_branch,
        }
    }

    /// Add an access of `kind` to `holder`.
    pub fn add_access<S: Into<Id>>(
        &mut self,
        owner: CompIdx,
        prefix: S,
        kind: AccessKind,
        holder: HolderIdx,
    ) -> CompIdx {
        let holder_kind = self.design.holders[holder].kind;
        assert!(
            kind.holder_kind() == holder_kind,
            "{kind:?} cannot target {:?} `{}`",
            holder_kind,
            self.design.holders[holder].name
        );
        let comp = self.new_component(
            prefix,
            ComponentKind::Access(Access::new(kind, holder)),
            Some(owner),
            kind.num_data_ports(),
            usize::from(kind.has_result()),
        );
        self.attach(owner, comp);
        comp
    }

    /// Add a stateless operation with `inputs` data ports and one result.
    pub fn add_op<S: Into<Id>>(
        &mut self,
        owner: CompIdx,
        prefix: S,
        op: OpKind,
        inputs: usize,
    ) -> CompIdx {
        let comp = self.new_component(
            prefix,
            ComponentKind::Op(op),
            Some(owner),
            inputs,
            1,
        );
        if let OpKind::Constant(value) = op {
            let result = self.result(comp, 0);
            self.design.buses[result].value = Some(value);
        }
        self.attach(owner, comp);
        comp
    }

    /// Add a call of `task` with the given number of arguments and results.
    pub fn add_call<S: Into<Id>>(
        &mut self,
        owner: CompIdx,
        prefix: S,
        task: TaskIdx,
        args: usize,
        results: usize,
    ) -> CompIdx {
        let comp = self.new_component(
            prefix,
            ComponentKind::TaskCall(task),
            Some(owner),
            args,
            results,
        );
        self.attach(owner, comp);
        comp
    }

    /// Record that `port` depends on `bus`.
    pub fn connect(
        &mut self,
        bus: BusIdx,
        port: PortIdx,
        kind: DependencyKind,
    ) {
        let owner = self.design.ports[port].owner;
        let comp = &mut self.design.components[owner];
        comp.entries[0].add_dependency(port, Dependency { bus, kind });
        self.design.buses[bus].dependents.push(port);
    }

    /// Make `after` wait for `before` to complete.
    pub fn sequence(&mut self, before: CompIdx, after: CompIdx) {
        let done = self.done(before);
        let go = self.go(after);
        self.connect(done, go, DependencyKind::Control);
    }

    /// Feed result `result` of `src` into data port `input` of `dst`.
    pub fn feed(
        &mut self,
        src: CompIdx,
        result: usize,
        dst: CompIdx,
        input: usize,
    ) {
        let bus = self.result(src, result);
        let port = self.data_port(dst, input);
        self.connect(bus, port, DependencyKind::Data);
    }

    /// Record a constant value discovered for `bus`.
    pub fn set_value(&mut self, bus: BusIdx, value: Option<u64>) {
        self.design.buses[bus].value = value;
    }

    pub fn go(&self, comp: CompIdx) -> PortIdx {
        self.design.components[comp].go
    }

    pub fn data_port(&self, comp: CompIdx, n: usize) -> PortIdx {
        self.design.components[comp].data_ports[n]
    }

    pub fn done(&self, comp: CompIdx) -> BusIdx {
        self.design.components[comp].exits[0].done
    }

    pub fn result(&self, comp: CompIdx, n: usize) -> BusIdx {
        self.design.components[comp].exits[0].data[n]
    }

    /// Create a detached component with its ports and buses.
    fn new_component<S: Into<Id>>(
        &mut self,
        prefix: S,
        kind: ComponentKind,
        owner: Option<CompIdx>,
        inputs: usize,
        results: usize,
    ) -> CompIdx {
        let name = self.design.namegen.gen_name(prefix);
        let idx = self.design.components.peek_next_idx();
        let go = self.design.ports.push(Port {
            name: Id::from("go"),
            owner: idx,
            kind: PortKind::Go,
        });
        let data_ports: SmallVec<[PortIdx; 2]> = (0..inputs)
            .map(|n| {
                self.design.ports.push(Port {
                    name: Id::from(format!("in{n}")),
                    owner: idx,
                    kind: PortKind::Data,
                })
            })
            .collect();
        let mut bus = |name: Id, kind: BusKind| {
            self.design.buses.push(Bus {
                name,
                owner: idx,
                kind,
                value: None,
                dependents: SmallVec::new(),
            })
        };
        let done = bus(Id::from("done"), BusKind::Done);
        let data = (0..results)
            .map(|n| bus(Id::from(format!("out{n}")), BusKind::Data))
            .collect();
        let pushed = self.design.components.push(Component {
            name,
            kind,
            owner,
            go,
            data_ports,
            entries: vec![Entry::default()],
            exits: vec![Exit { done, data }],
        });
        debug_assert_eq!(pushed, idx);
        pushed
    }

    /// Register `child` with the module `owner`.
    fn attach(&mut self, owner: CompIdx, child: CompIdx) {
        let name = self.design.components[owner].name;
        match &mut self.design.components[owner].kind {
            ComponentKind::Block(comps) => comps.push(child),
            ComponentKind::Branch(branch) => branch.components.push(child),
            ComponentKind::Loop { .. } => panic!(
                "Cannot add components to loop `{name}` directly; \
                 add them to its body"
            ),
            _ => panic!("Component `{name}` is not a module"),
        }
    }
}

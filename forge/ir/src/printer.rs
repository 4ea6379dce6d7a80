//! Implements a formatter for the in-memory representation of a design.
use crate::{self as ir, CompIdx, ComponentKind, Design};
use itertools::Itertools;
use std::io;

/// Printer for the IR.
pub struct Printer;

impl Printer {
    /// One-line description of a component: `name: kind(detail)`.
    pub fn component_to_str(design: &Design, comp: CompIdx) -> String {
        let Some(c) = design.get_component(comp) else {
            return format!("<unknown component {comp:?}>");
        };
        let detail = match &c.kind {
            ComponentKind::Access(access) => {
                design.holder(access.resource()).name.to_string()
            }
            ComponentKind::Op(ir::OpKind::Constant(v)) => v.to_string(),
            ComponentKind::TaskCall(task) => {
                design.task(*task).name.to_string()
            }
            _ => String::new(),
        };
        if detail.is_empty() {
            format!("{}: {}", c.name, c.kind_str())
        } else {
            format!("{}: {}({})", c.name, c.kind_str(), detail)
        }
    }

    /// Names of `comps` as `{a, b}`.
    pub fn component_set_to_str<'a>(
        design: &Design,
        comps: impl IntoIterator<Item = &'a CompIdx>,
    ) -> String {
        format!(
            "{{{}}}",
            comps
                .into_iter()
                .map(|c| design.component(*c).name)
                .join(", ")
        )
    }

    /// The chain of owners of `comp`, outermost first, as `a.b.c`.
    pub fn owners_to_str(design: &Design, comp: CompIdx) -> String {
        let mut names = design
            .owners(comp)
            .map(|c| design.component(c).name)
            .collect_vec();
        names.reverse();
        names.into_iter().join(".")
    }

    /// Prints every task of the design.
    pub fn write_design<F: io::Write>(
        design: &Design,
        f: &mut F,
    ) -> io::Result<()> {
        for (_, task) in design.tasks() {
            writeln!(f, "task {} {{", task.name)?;
            Self::write_component(design, task.body, 1, f)?;
            writeln!(f, "}}")?;
        }
        Ok(())
    }

    /// Prints `comp` and its children, one component per line.
    pub fn write_component<F: io::Write>(
        design: &Design,
        comp: CompIdx,
        indent_level: usize,
        f: &mut F,
    ) -> io::Result<()> {
        write!(f, "{}", " ".repeat(indent_level * 2))?;
        writeln!(f, "{}", Self::component_to_str(design, comp))?;
        for child in design.component(comp).children() {
            Self::write_component(design, child, indent_level + 1, f)?;
        }
        Ok(())
    }
}

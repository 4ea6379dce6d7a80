//! Naming and option handling for analyses driven from the command line.
use forge_ir as ir;
use itertools::Itertools;
use std::collections::HashSet;

/// Trait that describes named things. Options given to the compiler as
/// `<name>:<option>` are routed to the analysis with that name.
pub trait Named {
    /// The name of an analysis. Is used for identifying it in options.
    fn name() -> &'static str;
    /// A short description of the analysis.
    fn description() -> &'static str;
    /// Set of options that can be passed to the analysis.
    /// The options contains a tuple of the option name and a description.
    fn opts() -> &'static [(&'static str, &'static str)] {
        &[]
    }
}

/// Reads the options of a [Named] analysis out of [ir::Design::extra_opts].
pub trait ConstructOpts {
    /// One flag per entry of [Named::opts], in the same order, set when the
    /// option was given.
    fn get_opts(design: &ir::Design) -> Vec<bool>
    where
        Self: Named,
    {
        let opts = Self::opts();
        let n = Self::name();
        let given_opts: HashSet<_> = design
            .extra_opts
            .iter()
            .filter_map(|opt| {
                let mut splits = opt.split(':');
                if splits.next() == Some(n) {
                    splits.next()
                } else {
                    None
                }
            })
            .collect();

        let values = opts
            .iter()
            .map(|(o, _)| given_opts.contains(o))
            .collect_vec();

        if let Some(unknown) = given_opts
            .iter()
            .find(|&&o| !opts.iter().any(|(opt, _)| opt == &o))
        {
            log::warn!(
                "Ignoring unknown option for `{}`: {}",
                Self::name(),
                unknown
            );
        }

        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Extra options for {}: {}",
                Self::name(),
                opts.iter()
                    .zip(values.iter())
                    .map(|((o, _), v)| format!("{o}->{v}"))
                    .join(", ")
            );
        }

        values
    }
}

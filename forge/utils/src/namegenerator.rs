use crate::Id;
use std::collections::{HashMap, HashSet};

/// Hands out names that are unique within one design by suffixing a counter
/// to each requested prefix.
#[derive(Clone, Debug, Default)]
pub struct NameGenerator {
    name_hash: HashMap<Id, i64>,
    generated_names: HashSet<Id>,
}

impl NameGenerator {
    /// Create a NameGenerator that will never produce any of `names`.
    pub fn with_prev_defined_names(names: HashSet<Id>) -> Self {
        NameGenerator {
            generated_names: names,
            name_hash: HashMap::default(),
        }
    }

    /// Returns a new name that starts with `prefix`.
    /// The first request for a prefix returns the prefix itself:
    /// ```
    /// # use forge_utils::NameGenerator;
    /// let mut namegen = NameGenerator::default();
    /// assert_eq!(namegen.gen_name("rd"), "rd");
    /// assert_eq!(namegen.gen_name("rd"), "rd0");
    /// ```
    pub fn gen_name<S>(&mut self, prefix: S) -> Id
    where
        S: Into<Id>,
    {
        let mut cur_prefix: Id = prefix.into();
        loop {
            let count = self
                .name_hash
                .entry(cur_prefix)
                .and_modify(|v| *v += 1)
                .or_insert(-1);

            let name = if *count == -1 {
                cur_prefix
            } else {
                Id::from(format!("{cur_prefix}{count}"))
            };

            if self.generated_names.insert(name) {
                return name;
            }

            // Collided with a predefined name; extend the prefix instead.
            cur_prefix = name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NameGenerator;
    use crate::Id;
    use std::collections::HashSet;

    #[test]
    fn skips_predefined_names() {
        let taken: HashSet<Id> =
            ["wr", "wr0"].into_iter().map(Id::from).collect();
        let mut namegen = NameGenerator::with_prev_defined_names(taken);
        let first = namegen.gen_name("wr");
        assert_ne!(first, "wr");
        assert_ne!(first, "wr0");
        assert_ne!(namegen.gen_name("wr"), first);
    }
}

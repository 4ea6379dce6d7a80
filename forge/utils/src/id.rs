use symbol_table::GlobalSymbol;

/// Represents an identifier in a forge design. Identifiers are interned in a
/// global table so copying and comparing them is cheap.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id {
    id: GlobalSymbol,
}

impl Id {
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self {
            id: GlobalSymbol::from(id.as_ref()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.id.as_str()
    }
}

/// Names are ordered lexicographically so that printed sets are stable.
impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

/* =================== Impls for Id to make them easier to use ============== */

impl Default for Id {
    fn default() -> Self {
        Id::new("")
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.as_str(), f)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::new(s)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::new(s)
    }
}

impl From<&String> for Id {
    fn from(s: &String) -> Self {
        Id::new(s)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<String> for Id {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == other
    }
}

/// A trait representing something in the IR that has a name.
pub trait GetName {
    /// Return a reference to the object's name
    fn name(&self) -> Id;
}

#[cfg(test)]
mod tests {
    use super::Id;

    #[test]
    fn interned_ids_compare_by_value() {
        let a = Id::from("mem0");
        let b = Id::from(String::from("mem0"));
        assert_eq!(a, b);
        assert_eq!(a, "mem0");
        assert!(Id::from("a") < Id::from("b"));
        assert_eq!(format!("{a}"), "mem0");
    }
}

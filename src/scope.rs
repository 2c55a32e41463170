//! Call-local reference machinery.
//!
//! The reference scope is an ordered sequence of named schema nodes; Ref/Self
//! lookups take the first `$id` match, so prepending on entry gives nested
//! definitions shadowing without a shared mutable table. Both structures here
//! are extended by value per recursive call, so concurrent traversals over
//! the same schema tree never contend.

use crate::schema;
use crate::value::Value;

/// Ordered sequence of named schema nodes resolvable via `$ref`.
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    entries: Vec<&'a Value>,
}

impl<'a> Scope<'a> {
    pub fn from_refs(references: &[&'a Value]) -> Self {
        Self { entries: references.to_vec() }
    }

    /// First-match lookup by `$id`.
    pub fn resolve(&self, id: &str) -> Option<&'a Value> {
        self.entries
            .iter()
            .copied()
            .find(|entry| schema::schema_id(entry) == Some(id))
    }

    /// Scope for the subtree of `node`: prepended when the node carries its
    /// own `$id`, unchanged otherwise.
    pub fn entered(&self, node: &'a Value) -> Scope<'a> {
        let mut entries = self.entries.clone();
        if schema::schema_id(node).is_some() {
            entries.insert(0, node);
        }
        Scope { entries }
    }
}

/// Names of the reference definitions currently being expanded on one descent
/// of create/cast. Re-entering a name means the schema is recursive.
#[derive(Debug, Clone, Default)]
pub struct Expansion<'a> {
    names: Vec<&'a str>,
}

impl<'a> Expansion<'a> {
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| *n == name)
    }

    pub fn entered(&self, name: &'a str) -> Expansion<'a> {
        let mut names = self.names.clone();
        names.push(name);
        Expansion { names }
    }
}

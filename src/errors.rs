//! Hard-failure taxonomy for the schema engine.
//!
//! Value non-conformance is never an error: `check` reports it as `Ok(false)`.
//! The variants below all mean the *schema* (or the requested operation on it)
//! cannot be processed, and they propagate straight to the caller of the
//! top-level entry point.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A node encountered during traversal does not classify as any known
    /// schema variant.
    #[error("invalid schema: node does not match any known schema variant")]
    InvalidSchema,

    /// A Ref/Self node names a `$id` absent from the current scope.
    #[error("unresolved reference: no schema with $id '{0}' in scope")]
    UnresolvedReference(String),

    /// Synthesis re-entered a recursive definition with no default to stop on.
    #[error("recursive schema '{0}' requires a default value")]
    RecursiveDefaultRequired(String),

    /// Synthesis cannot manufacture a value satisfying this constraint.
    #[error("cannot synthesize a value satisfying constraint '{constraint}' without a default")]
    UnsupportedConstraint { constraint: &'static str },

    /// A union with zero branches has nothing to synthesize from.
    #[error("cannot synthesize from a union with zero variants")]
    EmptyUnion,

    /// Casting re-entered a recursive definition; casting recursive schemas is
    /// not supported.
    #[error("cannot cast recursive schema '{0}'")]
    UnsupportedOperation(String),
}

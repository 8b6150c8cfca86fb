use thiserror::Error;

/// Errors produced by type descriptor lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("type already registered: {0}")]
    DuplicateType(String),

    #[error("type `{type_name}` has no member `{member}`")]
    UnknownMember { type_name: String, member: String },

    #[error("invalid item id: {0}")]
    InvalidId(String),
}

/// Convenience alias for type results.
pub type TypeResult<T> = Result<T, TypeError>;

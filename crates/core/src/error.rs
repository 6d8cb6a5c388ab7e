//! Errors raised by souk's domain types.
//!
//! Email parsing has its own [`crate::EmailError`]; everything else in the
//! catalog and account models reports through [`DomainError`].

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Caller input the catalog refuses: a blank brand or product name, an
    /// oversized field, a product without images.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A record that breaks the owner/brand pairing: a brand owner with no
    /// brand, or any other role holding one. Only rehydration from storage
    /// produces this.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Text that is not a UUID where a `kind` id was expected.
    #[error("invalid {kind}: {reason}")]
    InvalidId { kind: &'static str, reason: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidId { kind, reason: reason.into() }
    }

    /// False when the data already on record is at fault rather than the caller.
    pub fn is_caller_fault(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_id_names_the_id_kind() {
        let err = DomainError::invalid_id("BrandId", "invalid length");
        assert_eq!(err.to_string(), "invalid BrandId: invalid length");
    }

    #[test]
    fn only_broken_records_are_not_the_callers_fault() {
        assert!(DomainError::validation("brand name cannot be empty").is_caller_fault());
        assert!(DomainError::invalid_id("ProductId", "bad").is_caller_fault());
        assert!(!DomainError::invariant("client owns a brand").is_caller_fault());
    }
}

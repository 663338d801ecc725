//! Engine error: domain failures plus storage failures.

use thiserror::Error;

use fatura_core::DomainError;
use fatura_infra::StoreError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Deterministic business failure; always caller-addressable.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The entity store failed. Interactive callers are told to retry;
    /// idempotent batch operations retry transient cases themselves.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Domain(DomainError::not_found(what))
    }
}

//! Bot-level error type.
//!
//! Handlers translate expected refusals (validation, conflicts, shortage)
//! into chat replies before they ever reach this type. What remains here
//! is the unexpected: storage failures, broken invariants surfacing as
//! domain errors, and transport failures. The dispatcher logs these and
//! answers with a generic apology.

use kudos_core::CoreError;
use kudos_store::{RepoError, StoreError};

use crate::transport::TransportError;

pub type BotResult<T> = Result<T, BotError>;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<RepoError> for BotError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Core(e) => BotError::Core(e),
            RepoError::Store(e) => BotError::Store(e),
        }
    }
}

//! The module contains the errors the engine can throw.
//!
//! Callers rarely need to match on individual variants: [`EngineError::kind`]
//! folds them into the four families a caller has to tell apart.
//!
//! - [`Validation`] malformed or out-of-range input, rejected before any lock.
//! - [`Precondition`] the loaded containers do not allow the operation.
//! - [`Conflict`] concurrent modification detected at commit; retry from scratch.
//! - [`Store`] persistence unavailable; fatal for the request.
//!
//!  [`Validation`]: ErrorKind::Validation
//!  [`Precondition`]: ErrorKind::Precondition
//!  [`Conflict`]: ErrorKind::Conflict
//!  [`Store`]: ErrorKind::Store
use sea_orm::{DbErr, RuntimeErr, sqlx};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Precondition failed: {0}")]
    Precondition(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Concurrent modification: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(DbErr),
}

/// Coarse classification of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Precondition,
    Conflict,
    Store,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Precondition => "precondition",
            Self::Conflict => "conflict",
            Self::Store => "store",
        }
    }

    /// Whether re-submitting the whole operation can succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Conflict)
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::ExistingKey(_) => ErrorKind::Validation,
            Self::Precondition(_) | Self::KeyNotFound(_) => ErrorKind::Precondition,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Database(_) => ErrorKind::Store,
        }
    }
}

/// SQLite `BUSY` (5) or `LOCKED` (6), including their extended codes.
fn is_busy_code(code: &str) -> bool {
    code.parse::<i32>()
        .is_ok_and(|code| matches!(code & 0xff, 5 | 6))
}

fn is_busy(err: &DbErr) -> bool {
    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))) = err
    else {
        return false;
    };
    db_err.code().is_some_and(|code| is_busy_code(&code))
}

impl From<DbErr> for EngineError {
    fn from(value: DbErr) -> Self {
        if is_busy(&value) {
            return Self::Conflict(value.to_string());
        }
        Self::Database(value)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Precondition(a), Self::Precondition(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

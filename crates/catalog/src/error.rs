//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Field-level input problems are not errors in this sense; they are plain
//! values, see [`ValidationErrors`](crate::validation::ValidationErrors).

use crate::models::Entity;
use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// The database could not be reached (pool exhausted, closed, I/O failure).
    #[display("database unavailable")]
    Unavailable,
    #[display("{_0} not found: {_1}")]
    NotFound(#[error(not(source))] Entity, i64),
    /// A uniqueness or referential rule would be broken by the write.
    #[display("constraint violation: {_0}")]
    Constraint(#[error(not(source))] Violation),
    /// Stored data could not be converted back into a model.
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Pick the kind for a failed write against `entity`.
    ///
    /// Unique and foreign key failures reported by SQLite become
    /// [`Constraint`](Self::Constraint). Connection level failures, and a
    /// database still locked once the busy timeout runs out, become
    /// [`Unavailable`](Self::Unavailable).
    pub(crate) fn from_sqlx(err: &sqlx::Error, entity: Entity) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => match entity.unique_field() {
                Some(field) => Self::Constraint(Violation::Unique { entity, field }),
                None => Self::Database,
            },
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Self::Constraint(Violation::ForeignKey { entity })
            },
            // SQLITE_BUSY, SQLITE_BUSY_SNAPSHOT and SQLITE_LOCKED.
            sqlx::Error::Database(db) if matches!(db.code().as_deref(), Some("5" | "517" | "6")) => {
                Self::Unavailable
            },
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable,
            _ => Self::Database,
        }
    }
}

/// Which rule a rejected write would have broken.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Another record already holds this value.
    #[display("{entity} {field} is already in use")]
    Unique { entity: Entity, field: &'static str },
    /// The write names a record that does not exist.
    #[display("{field} {id} does not exist")]
    MissingReference { field: &'static str, id: i64 },
    /// The record cannot be deleted while books still point at it.
    #[display("{entity} is still referenced by books")]
    StillReferenced { entity: Entity },
    /// SQLite rejected a reference without saying which one.
    #[display("{entity} has a dangling reference")]
    ForeignKey { entity: Entity },
}

/// Map a failed query onto an [`ErrorKind`] chosen from the error itself.
pub(crate) trait QueryResultExt<T> {
    fn or_classify(self, entity: Entity) -> Result<T>;
}
impl<T> QueryResultExt<T> for std::result::Result<T, sqlx::Error> {
    #[track_caller]
    fn or_classify(self, entity: Entity) -> Result<T> {
        use exn::ResultExt;
        match self {
            Ok(value) => Ok(value),
            Err(err) => {
                let kind = ErrorKind::from_sqlx(&err, entity);
                if kind == ErrorKind::Unavailable {
                    tracing::error!(error = %err, "catalog database unavailable");
                }
                Err(err).or_raise(|| kind)
            },
        }
    }
}

//! Database access layer
//!
//! The remote store is a MySQL database exposing named stored procedures.
//! This layer owns procedure invocation ([`procedure`]), result
//! normalization ([`normalize`]) and the classification of constraint
//! errors the handlers translate into conflict responses.

pub mod normalize;
pub mod procedure;

use sqlx::MySqlPool;

pub type DbPool = MySqlPool;

/// Constraint classification of a database error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Duplicate unique key (MySQL 1062)
    Duplicate,
    /// Row referenced by a foreign key (MySQL 1451/1452)
    Referenced,
    /// Anything else
    Other,
}

/// Classify a sqlx error by the constraint kind the server reported.
pub fn violation(err: &sqlx::Error) -> Violation {
    let Some(db_err) = err.as_database_error() else {
        return Violation::Other;
    };
    match db_err.kind() {
        sqlx::error::ErrorKind::UniqueViolation => Violation::Duplicate,
        sqlx::error::ErrorKind::ForeignKeyViolation => Violation::Referenced,
        _ => Violation::Other,
    }
}

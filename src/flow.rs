//! Transactional write flow
//!
//! Every catalog-mutating procedure runs through one protocol: open a
//! transaction, invoke the procedure, normalize the outcome, and commit only
//! when the outcome passes the caller's acceptance rule. A rejected outcome
//! rolls back; a rollback failure is logged but the primary failure is what
//! the caller sees.

use thiserror::Error;

use crate::db::normalize::{Normalized, normalize};
use crate::db::procedure::{ProcValue, call};
use crate::db::{DbPool, Violation, violation};
use crate::uploads::AssetResolution;

/// What a write must produce before it is committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteExpectation {
    /// A freshly created identifier (inserts)
    NewIdentifier,
    /// The 1-vs-not-1 success flag or a positive affected count (updates)
    SuccessFlag,
}

#[derive(Debug, Error)]
pub enum FlowError {
    /// The procedure ran but reported failure; carries the normalized outcome
    #[error("write rejected")]
    Rejected(Normalized),
    /// An insert committed nothing because no identifier could be extracted
    #[error("no identifier in procedure result")]
    ExtractionFailed,
    #[error("duplicate entry")]
    Duplicate(sqlx::Error),
    #[error("row is referenced")]
    Referenced(sqlx::Error),
    #[error(transparent)]
    Db(sqlx::Error),
}

fn classify(err: sqlx::Error) -> FlowError {
    match violation(&err) {
        Violation::Duplicate => FlowError::Duplicate(err),
        Violation::Referenced => FlowError::Referenced(err),
        Violation::Other => FlowError::Db(err),
    }
}

/// Run a write procedure inside a transaction and commit only when the
/// normalized outcome satisfies `expect`.
pub async fn transactional_write(
    pool: &DbPool,
    procedure: &str,
    params: Vec<ProcValue>,
    expect: WriteExpectation,
) -> Result<Normalized, FlowError> {
    let mut tx = pool.begin().await.map_err(classify)?;

    let raw = call(&mut *tx, procedure, params).await.map_err(classify)?;
    let outcome = normalize(&raw);

    let accepted = match expect {
        WriteExpectation::NewIdentifier => outcome.identifier.is_some(),
        WriteExpectation::SuccessFlag => outcome.is_success(),
    };

    if !accepted {
        if let Err(e) = tx.rollback().await {
            tracing::error!(procedure, error = %e, "Rollback failed after rejected write");
        }
        return Err(match expect {
            WriteExpectation::NewIdentifier => FlowError::ExtractionFailed,
            WriteExpectation::SuccessFlag => FlowError::Rejected(outcome),
        });
    }

    tx.commit().await.map_err(classify)?;
    Ok(outcome)
}

/// Update a catalog entry whose row carries an image reference: read the
/// current reference, let the caller resolve the one to persist, then run
/// the update through [`transactional_write`]. The resolution is returned
/// alongside the outcome so the handler can delete the replaced asset after
/// the commit.
pub async fn update_catalog_entry<R, B>(
    pool: &DbPool,
    procedure: &str,
    product_id: i64,
    resolve: R,
    build_params: B,
) -> Result<(Normalized, AssetResolution), FlowError>
where
    R: FnOnce(&str) -> AssetResolution,
    B: FnOnce(&AssetResolution) -> Vec<ProcValue>,
{
    let existing: String =
        sqlx::query_scalar::<_, Option<String>>("SELECT ImageName FROM products WHERE ProductID = ?")
            .bind(product_id)
            .fetch_optional(pool)
            .await
            .map_err(classify)?
            .flatten()
            .unwrap_or_default();

    let resolution = resolve(&existing);
    let params = build_params(&resolution);
    let outcome = transactional_write(pool, procedure, params, WriteExpectation::SuccessFlag).await?;
    Ok((outcome, resolution))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_non_database_errors_as_db() {
        match classify(sqlx::Error::PoolClosed) {
            FlowError::Db(_) => {}
            other => panic!("expected Db, got {other:?}"),
        }
    }

    #[test]
    fn test_rejected_keeps_outcome_message() {
        let outcome = Normalized {
            message: Some("Update failed".into()),
            ..Default::default()
        };
        match FlowError::Rejected(outcome) {
            FlowError::Rejected(o) => {
                assert_eq!(o.message_or("default"), "Update failed");
            }
            _ => unreachable!(),
        }
    }
}

//! Persistence contracts: stores open transactions, transactions act as repositories.
//!
//! Commands are generic over these traits; `quill-infra` provides the
//! in-memory and Postgres implementations.

use async_trait::async_trait;
use thiserror::Error;

use crate::entity::Entity;
use crate::error::{CommandError, NotFoundError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    NotFound(NotFoundError),

    /// Waiting for a row lock exceeded the configured lock timeout.
    #[error("timed out waiting for lock on {0}")]
    LockTimeout(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found<E: Entity>(id: &E::Id) -> Self {
        Self::NotFound(NotFoundError::new(E::NAME, id))
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Source of transactions.
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// A unit of work. Dropping it without `commit` discards every write.
#[async_trait]
pub trait Transaction: Send + Sized {
    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

/// Per-entity access inside a transaction.
///
/// `get` takes an exclusive row lock that is held until the transaction ends,
/// so two transactions loading the same row for mutation run one after the other.
#[async_trait]
pub trait Repository<E: Entity>: Send {
    async fn get(&mut self, id: &E::Id) -> Result<E, StoreError>;

    async fn save(&mut self, entity: &E) -> Result<(), StoreError>;

    async fn delete(&mut self, id: &E::Id) -> Result<(), StoreError>;
}

/// Commit on success, roll back on failure, and hand the outcome back.
pub async fn finish<T, Tx>(tx: Tx, outcome: Result<T, CommandError>) -> Result<T, CommandError>
where
    Tx: Transaction,
{
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

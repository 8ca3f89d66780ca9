use tracing::error;

use super::domain::{Participant, Reward, RewardId, RewardKind, RewardSubject};

/// Storage abstraction for reward records.
pub trait RewardRepository: Send + Sync {
    /// Inserts a reward without an id (assigning one) or replaces the stored record.
    fn save(&self, reward: Reward) -> Result<Reward, RepositoryError>;
}

/// Pre-filtered selection of rewards, typically pending ones for a subject.
pub trait RewardQuery {
    /// Human readable form of the query for logs.
    fn describe(&self) -> String;

    fn all(&self) -> Result<Vec<Reward>, RepositoryError>;
}

/// Transaction boundary of the storage backing a [`RewardRepository`].
pub trait TransactionManager: Send + Sync {
    fn begin(&self) -> Result<(), TransactionError>;
    fn commit(&self) -> Result<(), TransactionError>;
    fn rollback(&self) -> Result<(), TransactionError>;
}

/// Eligibility oracle listing who profits from a subject under a strategy.
pub trait ProfiteerResolver: Send + Sync {
    /// Profiteers in payout order. The engine trusts this list and does not deduplicate.
    fn profiteers(
        &self,
        kind: RewardKind,
        subject: &dyn RewardSubject,
    ) -> Result<Vec<Participant>, ResolverError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("reward {0} not found")]
    NotFound(RewardId),
    #[error("reward rejected by storage: {0}")]
    Rejected(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("a transaction is already active")]
    AlreadyActive,
    #[error("no transaction is active")]
    NotActive,
    #[error("transaction backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("profiteer lookup failed: {0}")]
    Lookup(String),
}

/// Open transaction that rolls back unless committed.
#[must_use = "dropping the scope rolls the transaction back"]
pub struct TransactionScope<'a> {
    manager: &'a dyn TransactionManager,
    finished: bool,
}

impl<'a> TransactionScope<'a> {
    pub fn begin(manager: &'a dyn TransactionManager) -> Result<Self, TransactionError> {
        manager.begin()?;
        Ok(Self {
            manager,
            finished: false,
        })
    }

    /// Commits the transaction. A failed commit is rolled back when the scope drops.
    pub fn commit(mut self) -> Result<(), TransactionError> {
        self.manager.commit()?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        if let Err(err) = self.manager.rollback() {
            error!(error = %err, "transaction rollback failed");
        }
    }
}

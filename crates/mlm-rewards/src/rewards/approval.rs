use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, info_span, warn};

use super::clock::Clock;
use super::domain::{Reward, RewardStatus, TransitionError};
use super::repository::{RepositoryError, RewardQuery, RewardRepository};
use crate::config::RewardSettings;

/// Terminal transition applied by a workflow pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardTransition {
    Approve,
    Deny,
}

impl RewardTransition {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "approval",
            Self::Deny => "denial",
        }
    }

    pub const fn target(self) -> RewardStatus {
        match self {
            Self::Approve => RewardStatus::Approved,
            Self::Deny => RewardStatus::Denied,
        }
    }

    fn is_expected(self, reward: &Reward, delay: Duration, now: DateTime<Utc>) -> bool {
        match self {
            Self::Approve => reward.expecting_approval(delay, now),
            Self::Deny => reward.expecting_denial(delay, now),
        }
    }

    fn apply(self, reward: &mut Reward, at: DateTime<Utc>) -> Result<(), TransitionError> {
        match self {
            Self::Approve => reward.approve(at).map(|_| ()),
            Self::Deny => reward.deny(at).map(|_| ()),
        }
    }
}

/// Why a single reward was left out of a workflow pass.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("reward in state {status} is not due for {transition}")]
    NotExpecting {
        status: RewardStatus,
        transition: &'static str,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("reward could not be persisted: {0}")]
    Persist(#[from] RepositoryError),
}

/// Moves pending rewards to a terminal state once their delay has elapsed.
///
/// Every record is checked, transitioned and saved on its own; a failing record is logged
/// and skipped without affecting the rest of the batch.
pub struct RewardApprovalWorkflow<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    settings: RewardSettings,
}

impl<R> RewardApprovalWorkflow<R>
where
    R: RewardRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>, settings: RewardSettings) -> Self {
        Self {
            repository,
            clock,
            settings,
        }
    }

    /// Approves every queried reward expecting approval, returning how many were saved.
    pub fn approve_all<Q>(&self, query: &Q, delay: Duration) -> Result<usize, RepositoryError>
    where
        Q: RewardQuery + ?Sized,
    {
        self.transition_all(query, delay, RewardTransition::Approve)
    }

    /// Denies every queried reward expecting denial, returning how many were saved.
    pub fn deny_all<Q>(&self, query: &Q, delay: Duration) -> Result<usize, RepositoryError>
    where
        Q: RewardQuery + ?Sized,
    {
        self.transition_all(query, delay, RewardTransition::Deny)
    }

    /// Approval pass using the configured approval delay.
    pub fn approve_due<Q>(&self, query: &Q) -> Result<usize, RepositoryError>
    where
        Q: RewardQuery + ?Sized,
    {
        self.approve_all(query, self.settings.approval_delay)
    }

    /// Denial pass using the configured denial delay.
    pub fn deny_due<Q>(&self, query: &Q) -> Result<usize, RepositoryError>
    where
        Q: RewardQuery + ?Sized,
    {
        self.deny_all(query, self.settings.denial_delay)
    }

    fn transition_all<Q>(
        &self,
        query: &Q,
        delay: Duration,
        transition: RewardTransition,
    ) -> Result<usize, RepositoryError>
    where
        Q: RewardQuery + ?Sized,
    {
        let span = info_span!(
            "reward_transition",
            key = %self.settings.log_key,
            transition = transition.label()
        );
        let _entered = span.enter();

        debug!(query = %query.describe(), "loading rewards");
        let rewards = query.all()?;
        let now = self.clock.now();

        let mut total = 0;
        for reward in rewards {
            let record = reward.log_record();
            debug!(reward = %record, "processing reward");

            match self.transition_one(reward, delay, now, transition) {
                Ok(_) => total += 1,
                Err(err @ RecordError::NotExpecting { .. }) => {
                    debug!(reward = %record, reason = %err, "reward skipped");
                }
                Err(err) => {
                    warn!(reward = %record, error = %err, "reward transition failed");
                }
            }
        }

        info!(total, "reward transition pass finished");
        Ok(total)
    }

    fn transition_one(
        &self,
        mut reward: Reward,
        delay: Duration,
        now: DateTime<Utc>,
        transition: RewardTransition,
    ) -> Result<Reward, RecordError> {
        if !transition.is_expected(&reward, delay, now) {
            return Err(RecordError::NotExpecting {
                status: reward.status,
                transition: transition.label(),
            });
        }

        transition.apply(&mut reward, now)?;
        Ok(self.repository.save(reward)?)
    }
}

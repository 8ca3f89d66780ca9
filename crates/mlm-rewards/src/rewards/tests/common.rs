use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::config::RewardSettings;
use crate::rewards::builder::{builder_for, RewardBuilder, RewardRates};
use crate::rewards::clock::ManualClock;
use crate::rewards::domain::{
    Participant, ParticipantId, Reward, RewardKind, RewardStatus, RewardSubject, SubjectId,
};
use crate::rewards::generator::RewardGenerator;
use crate::rewards::memory::{MemoryRewardStore, StaticProfiteerResolver};
use crate::rewards::repository::{
    ProfiteerResolver, RepositoryError, ResolverError, RewardQuery, RewardRepository,
    TransactionError, TransactionManager,
};

pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 12, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(t0()))
}

pub(super) fn settings(skip_worthless: bool) -> RewardSettings {
    RewardSettings {
        skip_worthless,
        ..RewardSettings::default()
    }
}

pub(super) fn subject_id(raw: &str) -> SubjectId {
    SubjectId(raw.to_string())
}

pub(super) fn participant_id(raw: &str) -> ParticipantId {
    ParticipantId(raw.to_string())
}

pub(super) fn generator<R, P>(
    store: Arc<R>,
    resolver: P,
    clock: Arc<ManualClock>,
    settings: RewardSettings,
) -> RewardGenerator<R, R, P>
where
    R: RewardRepository + TransactionManager + 'static,
    P: ProfiteerResolver + 'static,
{
    RewardGenerator::new(
        store.clone(),
        store,
        Arc::new(resolver),
        clock,
        settings,
        RewardRates::default(),
    )
}

pub(super) fn pending_reward(participant: &str, created_at: DateTime<Utc>) -> Reward {
    Reward {
        id: None,
        subject_id: subject_id("order-1"),
        participant_id: participant_id(participant),
        kind: RewardKind::Basic,
        value: 100,
        status: RewardStatus::Pending,
        created_at,
        status_changed_at: None,
    }
}

/// Store that rejects saves for selected participants.
#[derive(Debug, Clone, Default)]
pub(super) struct RejectingStore {
    pub(super) store: MemoryRewardStore,
    rejected: BTreeSet<ParticipantId>,
}

impl RejectingStore {
    pub(super) fn rejecting(store: MemoryRewardStore, participants: &[&str]) -> Self {
        Self {
            store,
            rejected: participants.iter().map(|raw| participant_id(raw)).collect(),
        }
    }
}

impl RewardRepository for RejectingStore {
    fn save(&self, reward: Reward) -> Result<Reward, RepositoryError> {
        if self.rejected.contains(&reward.participant_id) {
            return Err(RepositoryError::Rejected(format!(
                "constraint violation for {}",
                reward.participant_id
            )));
        }
        self.store.save(reward)
    }
}

impl TransactionManager for RejectingStore {
    fn begin(&self) -> Result<(), TransactionError> {
        self.store.begin()
    }

    fn commit(&self) -> Result<(), TransactionError> {
        self.store.commit()
    }

    fn rollback(&self) -> Result<(), TransactionError> {
        self.store.rollback()
    }
}

/// Store whose `nth` commit fails after the strategy's saves went through.
pub(super) struct FailingCommitStore {
    pub(super) store: MemoryRewardStore,
    commits: AtomicUsize,
    failing: usize,
}

impl FailingCommitStore {
    pub(super) fn failing_commit(store: MemoryRewardStore, nth: usize) -> Self {
        Self {
            store,
            commits: AtomicUsize::new(0),
            failing: nth,
        }
    }
}

impl RewardRepository for FailingCommitStore {
    fn save(&self, reward: Reward) -> Result<Reward, RepositoryError> {
        self.store.save(reward)
    }
}

impl TransactionManager for FailingCommitStore {
    fn begin(&self) -> Result<(), TransactionError> {
        self.store.begin()
    }

    fn commit(&self) -> Result<(), TransactionError> {
        if self.commits.fetch_add(1, Ordering::SeqCst) == self.failing {
            return Err(TransactionError::Backend("serialization failure".to_string()));
        }
        self.store.commit()
    }

    fn rollback(&self) -> Result<(), TransactionError> {
        self.store.rollback()
    }
}

/// Builder that runs every step but never hands over a reward.
struct HollowBuilder {
    kind: RewardKind,
    subject_id: SubjectId,
}

impl RewardBuilder for HollowBuilder {
    fn kind(&self) -> RewardKind {
        self.kind
    }

    fn subject_id(&self) -> SubjectId {
        self.subject_id.clone()
    }

    fn initialize(&mut self, _created_at: DateTime<Utc>) {}

    fn compute_value(&mut self, _participant: &Participant) {}

    fn assign_ownership(&mut self, _participant: &Participant) {}

    fn finalize(&mut self) -> Option<Reward> {
        None
    }
}

/// Regular builders, except basic which produces nothing.
pub(super) fn hollow_basic_builders<'a>(
    kind: RewardKind,
    subject: &'a dyn RewardSubject,
    rates: &RewardRates,
) -> Box<dyn RewardBuilder + 'a> {
    match kind {
        RewardKind::Basic => Box::new(HollowBuilder {
            kind,
            subject_id: subject.subject_id(),
        }),
        _ => builder_for(kind, subject, rates),
    }
}

/// Resolver whose lookups fail for one strategy.
pub(super) struct BrokenResolver {
    pub(super) inner: StaticProfiteerResolver,
    pub(super) broken: RewardKind,
}

impl ProfiteerResolver for BrokenResolver {
    fn profiteers(
        &self,
        kind: RewardKind,
        subject: &dyn RewardSubject,
    ) -> Result<Vec<Participant>, ResolverError> {
        if kind == self.broken {
            return Err(ResolverError::Lookup("network tree unavailable".to_string()));
        }
        self.inner.profiteers(kind, subject)
    }
}

pub(super) struct UnavailableQuery;

impl RewardQuery for UnavailableQuery {
    fn describe(&self) -> String {
        "SELECT * FROM reward WHERE status = 'pending'".to_string()
    }

    fn all(&self) -> Result<Vec<Reward>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

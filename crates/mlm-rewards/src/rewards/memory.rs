//! In-process collaborators backing the CLI and tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Participant, Reward, RewardId, RewardKind, RewardStatus, RewardSubject, SubjectId,
};
use super::repository::{
    ProfiteerResolver, RepositoryError, ResolverError, RewardQuery, RewardRepository,
    TransactionError, TransactionManager,
};

#[derive(Debug, Default)]
struct StoreState {
    records: BTreeMap<RewardId, Reward>,
    last_id: u64,
    snapshot: Option<BTreeMap<RewardId, Reward>>,
}

/// Reward storage with single-level snapshot transactions. Ids are never reused, even
/// after a rollback. Clones share the same records.
#[derive(Debug, Default, Clone)]
pub struct MemoryRewardStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryRewardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store; rewards without an id are assigned one.
    pub fn with_rewards(rewards: impl IntoIterator<Item = Reward>) -> Self {
        let store = Self::default();
        {
            let mut state = store.lock();
            let mut unsaved = Vec::new();
            for reward in rewards {
                match reward.id {
                    Some(id) => {
                        state.last_id = state.last_id.max(id.0);
                        state.records.insert(id, reward);
                    }
                    None => unsaved.push(reward),
                }
            }
            for mut reward in unsaved {
                state.last_id += 1;
                let id = RewardId(state.last_id);
                reward.id = Some(id);
                state.records.insert(id, reward);
            }
        }
        store
    }

    /// Stored rewards ordered by id.
    pub fn rewards(&self) -> Vec<Reward> {
        self.lock().records.values().cloned().collect()
    }

    pub fn get(&self, id: RewardId) -> Option<Reward> {
        self.lock().records.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    pub fn in_transaction(&self) -> bool {
        self.lock().snapshot.is_some()
    }

    pub fn query(&self) -> MemoryRewardQuery {
        MemoryRewardQuery {
            store: self.clone(),
            status: None,
            subject: None,
            kind: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // Every mutation leaves the state consistent before it can panic.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RewardRepository for MemoryRewardStore {
    fn save(&self, mut reward: Reward) -> Result<Reward, RepositoryError> {
        let mut state = self.lock();
        match reward.id {
            Some(id) => {
                if !state.records.contains_key(&id) {
                    return Err(RepositoryError::NotFound(id));
                }
                state.records.insert(id, reward.clone());
            }
            None => {
                state.last_id += 1;
                let id = RewardId(state.last_id);
                reward.id = Some(id);
                state.records.insert(id, reward.clone());
            }
        }
        Ok(reward)
    }
}

impl TransactionManager for MemoryRewardStore {
    fn begin(&self) -> Result<(), TransactionError> {
        let mut state = self.lock();
        if state.snapshot.is_some() {
            return Err(TransactionError::AlreadyActive);
        }
        state.snapshot = Some(state.records.clone());
        Ok(())
    }

    fn commit(&self) -> Result<(), TransactionError> {
        let mut state = self.lock();
        state
            .snapshot
            .take()
            .map(|_| ())
            .ok_or(TransactionError::NotActive)
    }

    fn rollback(&self) -> Result<(), TransactionError> {
        let mut state = self.lock();
        let snapshot = state.snapshot.take().ok_or(TransactionError::NotActive)?;
        state.records = snapshot;
        Ok(())
    }
}

/// Filtered view over a [`MemoryRewardStore`], evaluated on every `all()` call.
#[derive(Debug, Clone)]
pub struct MemoryRewardQuery {
    store: MemoryRewardStore,
    status: Option<RewardStatus>,
    subject: Option<SubjectId>,
    kind: Option<RewardKind>,
}

impl MemoryRewardQuery {
    pub fn status(mut self, status: RewardStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn subject(mut self, subject: SubjectId) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn kind(mut self, kind: RewardKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn matches(&self, reward: &Reward) -> bool {
        self.status.map_or(true, |status| reward.status == status)
            && self
                .subject
                .as_ref()
                .map_or(true, |subject| &reward.subject_id == subject)
            && self.kind.map_or(true, |kind| reward.kind == kind)
    }
}

impl RewardQuery for MemoryRewardQuery {
    fn describe(&self) -> String {
        let mut conditions = Vec::new();
        if let Some(status) = self.status {
            conditions.push(format!("status = '{status}'"));
        }
        if let Some(subject) = &self.subject {
            conditions.push(format!("subject_id = '{subject}'"));
        }
        if let Some(kind) = self.kind {
            conditions.push(format!("kind = '{kind}'"));
        }

        if conditions.is_empty() {
            "SELECT * FROM reward ORDER BY id".to_string()
        } else {
            format!(
                "SELECT * FROM reward WHERE {} ORDER BY id",
                conditions.join(" AND ")
            )
        }
    }

    fn all(&self) -> Result<Vec<Reward>, RepositoryError> {
        Ok(self
            .store
            .rewards()
            .into_iter()
            .filter(|reward| self.matches(reward))
            .collect())
    }
}

/// Resolver answering from a fixed table of profiteers per subject and strategy.
#[derive(Debug, Default, Clone)]
pub struct StaticProfiteerResolver {
    profiteers: BTreeMap<(SubjectId, RewardKind), Vec<Participant>>,
}

impl StaticProfiteerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        subject: SubjectId,
        kind: RewardKind,
        participants: Vec<Participant>,
    ) -> Self {
        self.profiteers.insert((subject, kind), participants);
        self
    }

    /// Appends one profiteer, keeping insertion order.
    pub fn push(&mut self, subject: SubjectId, kind: RewardKind, participant: Participant) {
        self.profiteers
            .entry((subject, kind))
            .or_default()
            .push(participant);
    }
}

impl ProfiteerResolver for StaticProfiteerResolver {
    fn profiteers(
        &self,
        kind: RewardKind,
        subject: &dyn RewardSubject,
    ) -> Result<Vec<Participant>, ResolverError> {
        Ok(self
            .profiteers
            .get(&(subject.subject_id(), kind))
            .cloned()
            .unwrap_or_default())
    }
}

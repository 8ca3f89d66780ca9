//! Reward construction strategies.
//!
//! Each builder is bound to one subject and reused for every profiteer of its strategy
//! within a generation pass. The director drives the steps; a builder never persists.

mod basic;
mod custom;
mod extra;
mod rates;

pub use basic::BasicRewardBuilder;
pub use custom::CustomRewardBuilder;
pub use extra::ExtraRewardBuilder;
pub use rates::{RatesError, RewardRates};

use chrono::{DateTime, Utc};

use super::domain::{
    Participant, ParticipantId, Reward, RewardKind, RewardStatus, RewardSubject, SubjectId,
};

/// Construction steps shared by every strategy, invoked in declaration order.
pub trait RewardBuilder {
    fn kind(&self) -> RewardKind;

    fn subject_id(&self) -> SubjectId;

    /// Starts a fresh draft, discarding any unfinished one.
    fn initialize(&mut self, created_at: DateTime<Utc>);

    fn compute_value(&mut self, participant: &Participant);

    fn assign_ownership(&mut self, participant: &Participant);

    /// Hands over the completed draft. `None` when a step was skipped.
    fn finalize(&mut self) -> Option<Reward>;
}

/// Builds the strategy's builder for `subject`.
pub fn builder_for<'a>(
    kind: RewardKind,
    subject: &'a dyn RewardSubject,
    rates: &RewardRates,
) -> Box<dyn RewardBuilder + 'a> {
    match kind {
        RewardKind::Basic => Box::new(BasicRewardBuilder::instance(subject, rates)),
        RewardKind::Extra => Box::new(ExtraRewardBuilder::instance(subject, rates)),
        RewardKind::Custom => Box::new(CustomRewardBuilder::instance(subject)),
    }
}

#[derive(Debug, Clone)]
struct RewardDraft {
    created_at: DateTime<Utc>,
    value: u64,
    participant_id: Option<ParticipantId>,
}

/// Draft bookkeeping shared by the strategy builders.
pub(crate) struct BuilderCore<'a> {
    subject: &'a dyn RewardSubject,
    kind: RewardKind,
    draft: Option<RewardDraft>,
}

impl<'a> BuilderCore<'a> {
    pub(crate) fn new(subject: &'a dyn RewardSubject, kind: RewardKind) -> Self {
        Self {
            subject,
            kind,
            draft: None,
        }
    }

    pub(crate) fn subject(&self) -> &'a dyn RewardSubject {
        self.subject
    }

    pub(crate) fn kind(&self) -> RewardKind {
        self.kind
    }

    pub(crate) fn initialize(&mut self, created_at: DateTime<Utc>) {
        self.draft = Some(RewardDraft {
            created_at,
            value: 0,
            participant_id: None,
        });
    }

    pub(crate) fn set_value(&mut self, value: u64) {
        if let Some(draft) = self.draft.as_mut() {
            draft.value = value;
        }
    }

    pub(crate) fn assign(&mut self, participant: &Participant) {
        if let Some(draft) = self.draft.as_mut() {
            draft.participant_id = Some(participant.id.clone());
        }
    }

    pub(crate) fn finalize(&mut self) -> Option<Reward> {
        let draft = self.draft.take()?;
        let participant_id = draft.participant_id?;

        Some(Reward {
            id: None,
            subject_id: self.subject.subject_id(),
            participant_id,
            kind: self.kind,
            value: draft.value,
            status: RewardStatus::Pending,
            created_at: draft.created_at,
            status_changed_at: None,
        })
    }
}

/// `amount * bps / 10_000`, rounded down.
pub(crate) fn share_of(amount: u64, bps: u32) -> u64 {
    let share = u128::from(amount) * u128::from(bps) / 10_000;
    u64::try_from(share).unwrap_or(u64::MAX)
}

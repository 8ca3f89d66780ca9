use chrono::{DateTime, Utc};

use super::{share_of, BuilderCore, RewardBuilder, RewardRates};
use crate::rewards::domain::{Participant, Reward, RewardKind, RewardSubject, SubjectId};

/// Tiered share of the subject amount for the upline of the subject's originator.
pub struct BasicRewardBuilder<'a> {
    core: BuilderCore<'a>,
    rates: RewardRates,
}

impl<'a> BasicRewardBuilder<'a> {
    pub fn instance(subject: &'a dyn RewardSubject, rates: &RewardRates) -> Self {
        Self {
            core: BuilderCore::new(subject, RewardKind::Basic),
            rates: rates.clone(),
        }
    }
}

impl RewardBuilder for BasicRewardBuilder<'_> {
    fn kind(&self) -> RewardKind {
        self.core.kind()
    }

    fn subject_id(&self) -> SubjectId {
        self.core.subject().subject_id()
    }

    fn initialize(&mut self, created_at: DateTime<Utc>) {
        self.core.initialize(created_at);
    }

    fn compute_value(&mut self, participant: &Participant) {
        let bps = self.rates.basic_bps_for_tier(participant.tier);
        let value = share_of(self.core.subject().amount(), bps);
        self.core.set_value(value);
    }

    fn assign_ownership(&mut self, participant: &Participant) {
        self.core.assign(participant);
    }

    fn finalize(&mut self) -> Option<Reward> {
        self.core.finalize()
    }
}

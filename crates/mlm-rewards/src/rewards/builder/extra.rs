use chrono::{DateTime, Utc};

use super::{share_of, BuilderCore, RewardBuilder, RewardRates};
use crate::rewards::domain::{Participant, Reward, RewardKind, RewardSubject, SubjectId};

/// Flat bonus share paid to every extra profiteer regardless of tier.
pub struct ExtraRewardBuilder<'a> {
    core: BuilderCore<'a>,
    bps: u32,
}

impl<'a> ExtraRewardBuilder<'a> {
    pub fn instance(subject: &'a dyn RewardSubject, rates: &RewardRates) -> Self {
        Self {
            core: BuilderCore::new(subject, RewardKind::Extra),
            bps: rates.extra_bps,
        }
    }
}

impl RewardBuilder for ExtraRewardBuilder<'_> {
    fn kind(&self) -> RewardKind {
        self.core.kind()
    }

    fn subject_id(&self) -> SubjectId {
        self.core.subject().subject_id()
    }

    fn initialize(&mut self, created_at: DateTime<Utc>) {
        self.core.initialize(created_at);
    }

    fn compute_value(&mut self, _participant: &Participant) {
        let value = share_of(self.core.subject().amount(), self.bps);
        self.core.set_value(value);
    }

    fn assign_ownership(&mut self, participant: &Participant) {
        self.core.assign(participant);
    }

    fn finalize(&mut self) -> Option<Reward> {
        self.core.finalize()
    }
}

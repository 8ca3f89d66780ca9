use chrono::{DateTime, Utc};

use super::{share_of, BuilderCore, RewardBuilder};
use crate::rewards::domain::{Participant, Reward, RewardKind, RewardSubject, SubjectId};

/// Participant-specific share negotiated outside the tier table.
pub struct CustomRewardBuilder<'a> {
    core: BuilderCore<'a>,
}

impl<'a> CustomRewardBuilder<'a> {
    pub fn instance(subject: &'a dyn RewardSubject) -> Self {
        Self {
            core: BuilderCore::new(subject, RewardKind::Custom),
        }
    }
}

impl RewardBuilder for CustomRewardBuilder<'_> {
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
        let bps = participant.custom_share_bps.unwrap_or(0);
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

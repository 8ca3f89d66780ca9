use std::sync::Arc;

use super::builder::RewardBuilder;
use super::clock::Clock;
use super::domain::{Participant, Reward};

/// Drives a builder through its construction steps for one participant.
pub struct RewardDirector {
    clock: Arc<dyn Clock>,
}

impl RewardDirector {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Produces an unsaved, pending reward stamped with the current instant.
    pub fn build(
        &self,
        builder: &mut dyn RewardBuilder,
        participant: &Participant,
    ) -> Option<Reward> {
        builder.initialize(self.clock.now());
        builder.compute_value(participant);
        builder.assign_ownership(participant);
        builder.finalize()
    }
}

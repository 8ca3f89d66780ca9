//! Reward generation and the approval/denial workflow.
//!
//! Generation runs the basic, extra and custom strategies against a subject, building one
//! reward per profiteer and persisting each strategy under its own transaction. The
//! workflow later moves pending rewards to approved or denied once a delay has elapsed.

mod approval;
pub mod builder;
mod clock;
mod director;
pub mod domain;
mod generator;
pub mod ledger;
mod memory;
mod pocket;
pub mod repository;

#[cfg(test)]
mod tests;

pub use approval::{RecordError, RewardApprovalWorkflow, RewardTransition};
pub use builder::{
    BasicRewardBuilder, CustomRewardBuilder, ExtraRewardBuilder, RewardBuilder, RewardRates,
};
pub use clock::{Clock, ClockError, ManualClock, SystemClock};
pub use director::RewardDirector;
pub use domain::{
    Participant, ParticipantId, Reward, RewardId, RewardKind, RewardLogRecord, RewardStatus,
    RewardSubject, SubjectId, SubjectSnapshot, TransitionError,
};
pub use generator::{GenerationError, RewardGenerator};
pub use ledger::LedgerError;
pub use memory::{MemoryRewardQuery, MemoryRewardStore, StaticProfiteerResolver};
pub use pocket::{Pocket, PocketItem};
pub use repository::{
    ProfiteerResolver, RepositoryError, ResolverError, RewardQuery, RewardRepository,
    TransactionError, TransactionManager, TransactionScope,
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the business event rewards are generated for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a network member receiving rewards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage-assigned primary key of a persisted reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RewardId(pub u64);

impl fmt::Display for RewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reward computation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Basic,
    Extra,
    Custom,
}

impl RewardKind {
    /// Generation order, broadest eligibility first.
    pub const fn ordered() -> [Self; 3] {
        [Self::Basic, Self::Extra, Self::Custom]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Extra => "extra",
            Self::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "extra" => Some(Self::Extra),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a reward. `Approved` and `Denied` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    Pending,
    Approved,
    Denied,
}

impl RewardStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }

    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "denied" => Some(Self::Denied),
            _ => None,
        }
    }
}

impl fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Business event that triggers reward generation. Owned and mutated elsewhere; the
/// engine only reads it.
pub trait RewardSubject {
    fn subject_id(&self) -> SubjectId;

    /// Monetary basis (minor currency units) the builders derive reward values from.
    fn amount(&self) -> u64;

    fn can_reward_by(&self, kind: RewardKind) -> bool;
}

/// Plain data subject used by the ledger import and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSnapshot {
    pub id: SubjectId,
    pub amount: u64,
    pub basic: bool,
    pub extra: bool,
    pub custom: bool,
}

impl SubjectSnapshot {
    pub fn new(id: impl Into<String>, amount: u64) -> Self {
        Self {
            id: SubjectId(id.into()),
            amount,
            basic: false,
            extra: false,
            custom: false,
        }
    }

    pub fn rewardable_by(mut self, kind: RewardKind) -> Self {
        match kind {
            RewardKind::Basic => self.basic = true,
            RewardKind::Extra => self.extra = true,
            RewardKind::Custom => self.custom = true,
        }
        self
    }
}

impl RewardSubject for SubjectSnapshot {
    fn subject_id(&self) -> SubjectId {
        self.id.clone()
    }

    fn amount(&self) -> u64 {
        self.amount
    }

    fn can_reward_by(&self, kind: RewardKind) -> bool {
        match kind {
            RewardKind::Basic => self.basic,
            RewardKind::Extra => self.extra,
            RewardKind::Custom => self.custom,
        }
    }
}

/// Network member eligible for a reward under one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Distance from the subject's originator in the network, 1 being the direct sponsor.
    pub tier: u8,
    pub custom_share_bps: Option<u32>,
}

impl Participant {
    pub fn new(id: impl Into<String>, tier: u8) -> Self {
        Self {
            id: ParticipantId(id.into()),
            tier,
            custom_share_bps: None,
        }
    }

    pub fn with_custom_share(mut self, bps: u32) -> Self {
        self.custom_share_bps = Some(bps);
        self
    }
}

/// Raised when a reward is asked to leave a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("reward is already {status} and cannot become {requested}")]
    NotPending {
        status: RewardStatus,
        requested: RewardStatus,
    },
}

/// Monetary credit earned by a participant for a subject under one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: Option<RewardId>,
    pub subject_id: SubjectId,
    pub participant_id: ParticipantId,
    pub kind: RewardKind,
    /// Minor currency units.
    pub value: u64,
    pub status: RewardStatus,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: Option<DateTime<Utc>>,
}

impl Reward {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_worthless(&self) -> bool {
        self.value == 0
    }

    pub fn expecting_approval(&self, delay: Duration, now: DateTime<Utc>) -> bool {
        self.pending_for_at_least(delay, now)
    }

    pub fn expecting_denial(&self, delay: Duration, now: DateTime<Utc>) -> bool {
        self.pending_for_at_least(delay, now)
    }

    pub fn approve(&mut self, at: DateTime<Utc>) -> Result<&mut Self, TransitionError> {
        self.transition(RewardStatus::Approved, at)
    }

    pub fn deny(&mut self, at: DateTime<Utc>) -> Result<&mut Self, TransitionError> {
        self.transition(RewardStatus::Denied, at)
    }

    pub fn log_record(&self) -> RewardLogRecord {
        RewardLogRecord {
            id: self.id,
            subject_id: self.subject_id.clone(),
            participant_id: self.participant_id.clone(),
            kind: self.kind,
            value: self.value,
            status: self.status,
        }
    }

    fn pending_for_at_least(&self, delay: Duration, now: DateTime<Utc>) -> bool {
        self.status.is_pending() && now.signed_duration_since(self.created_at) >= delay
    }

    fn transition(
        &mut self,
        target: RewardStatus,
        at: DateTime<Utc>,
    ) -> Result<&mut Self, TransitionError> {
        if !self.status.is_pending() {
            return Err(TransitionError::NotPending {
                status: self.status,
                requested: target,
            });
        }

        self.status = target;
        self.status_changed_at = Some(at);
        Ok(self)
    }
}

/// Key fields of a reward, emitted with log events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardLogRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RewardId>,
    pub subject_id: SubjectId,
    pub participant_id: ParticipantId,
    pub kind: RewardKind,
    pub value: u64,
    pub status: RewardStatus,
}

impl fmt::Display for RewardLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "reward #{id}")?,
            None => f.write_str("unsaved reward")?,
        }
        write!(
            f,
            " [{} subject={} participant={} value={} status={}]",
            self.kind, self.subject_id, self.participant_id, self.value, self.status
        )
    }
}

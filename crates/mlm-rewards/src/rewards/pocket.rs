use super::domain::Reward;

/// Persisted reward held by the pocket for the duration of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PocketItem {
    reward: Reward,
}

impl PocketItem {
    pub fn new(reward: Reward) -> Self {
        Self { reward }
    }

    pub fn reward(&self) -> &Reward {
        &self.reward
    }

    pub fn into_reward(self) -> Reward {
        self.reward
    }
}

/// Per-call accumulator of rewards produced by a generation pass.
///
/// Sizes are used as markers: capture `size()` before a unit of work and read
/// `size_since(mark)` afterwards for the number of rewards it produced. When a unit of
/// work is undone, `rollback_to(mark)` drops everything it added.
#[derive(Debug, Default, Clone)]
pub struct Pocket {
    items: Vec<PocketItem>,
}

impl Pocket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn add(&mut self, item: PocketItem) {
        self.items.push(item);
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn size_since(&self, baseline: usize) -> usize {
        self.items.len().saturating_sub(baseline)
    }

    pub fn rollback_to(&mut self, mark: usize) {
        self.items.truncate(mark);
    }

    pub fn items(&self) -> &[PocketItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_rewards(self) -> Vec<Reward> {
        self.items.into_iter().map(PocketItem::into_reward).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::domain::{ParticipantId, RewardId, RewardKind, RewardStatus, SubjectId};
    use chrono::Utc;

    fn item(id: u64) -> PocketItem {
        PocketItem::new(Reward {
            id: Some(RewardId(id)),
            subject_id: SubjectId("s-1".to_string()),
            participant_id: ParticipantId(format!("p-{id}")),
            kind: RewardKind::Basic,
            value: 10,
            status: RewardStatus::Pending,
            created_at: Utc::now(),
            status_changed_at: None,
        })
    }

    #[test]
    fn size_since_reports_delta_from_marker() {
        let mut pocket = Pocket::new();
        pocket.add(item(1));
        let mark = pocket.size();
        pocket.add(item(2));
        pocket.add(item(3));

        assert_eq!(pocket.size(), 3);
        assert_eq!(pocket.size_since(mark), 2);
        assert_eq!(pocket.size_since(10), 0);
    }

    #[test]
    fn rollback_to_discards_items_after_marker() {
        let mut pocket = Pocket::new();
        pocket.add(item(1));
        let mark = pocket.size();
        pocket.add(item(2));

        pocket.rollback_to(mark);

        assert_eq!(pocket.size(), 1);
        assert_eq!(pocket.items()[0].reward().id, Some(RewardId(1)));
    }

    #[test]
    fn clear_empties_pocket() {
        let mut pocket = Pocket::new();
        pocket.add(item(1));
        pocket.clear();
        assert!(pocket.is_empty());
    }
}

use crate::infra::print_json;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use mlm_rewards::config::AppConfig;
use mlm_rewards::error::AppError;
use mlm_rewards::rewards::{
    ManualClock, MemoryRewardStore, Participant, Reward, RewardApprovalWorkflow,
    RewardGenerator, RewardKind, RewardStatus, StaticProfiteerResolver, SubjectId,
    SubjectSnapshot,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Amount (minor units) of the purchase that triggers the rewards
    #[arg(long, default_value_t = 25_000)]
    pub(crate) amount: u64,
    /// Hours to wait before the settlement passes run
    #[arg(long = "wait-hours", default_value = "49", value_parser = crate::infra::parse_hours)]
    pub(crate) wait: Duration,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    started_at: DateTime<Utc>,
    settled_at: DateTime<Utc>,
    generated: Vec<DemoGeneration>,
    approved: usize,
    denied: usize,
    rewards: Vec<Reward>,
}

#[derive(Debug, Serialize)]
struct DemoGeneration {
    subject_id: SubjectId,
    generated: usize,
}

/// Two purchases by the same downline; the second one is cancelled before settlement,
/// so its rewards are denied while the first purchase's rewards are approved.
pub(crate) fn run_demo(args: DemoArgs, config: &AppConfig) -> Result<(), AppError> {
    let started_at = Utc::now();
    let clock = Arc::new(ManualClock::new(started_at));
    let store = Arc::new(MemoryRewardStore::new());

    let purchase = SubjectSnapshot::new("purchase-1001", args.amount)
        .rewardable_by(RewardKind::Basic)
        .rewardable_by(RewardKind::Extra)
        .rewardable_by(RewardKind::Custom);
    let cancelled = SubjectSnapshot::new("purchase-1002", args.amount / 2)
        .rewardable_by(RewardKind::Basic);

    let resolver = sample_network(&[&purchase.id, &cancelled.id]);

    let generator = RewardGenerator::new(
        store.clone(),
        store.clone(),
        Arc::new(resolver),
        clock.clone(),
        config.rewards.clone(),
        config.rates.clone(),
    );

    let generated: Vec<DemoGeneration> = [&purchase, &cancelled]
        .into_iter()
        .map(|subject| DemoGeneration {
            subject_id: subject.id.clone(),
            generated: generator.generate_all(subject),
        })
        .collect();

    let settled_at = clock.advance(args.wait)?;
    let workflow =
        RewardApprovalWorkflow::new(store.clone(), clock.clone(), config.rewards.clone());

    let denied = workflow.deny_due(
        &store
            .query()
            .status(RewardStatus::Pending)
            .subject(cancelled.id.clone()),
    )?;
    let approved = workflow.approve_due(
        &store
            .query()
            .status(RewardStatus::Pending)
            .subject(purchase.id.clone()),
    )?;

    print_json(&DemoReport {
        started_at,
        settled_at,
        generated,
        approved,
        denied,
        rewards: store.rewards(),
    })
}

fn sample_network(subjects: &[&SubjectId]) -> StaticProfiteerResolver {
    let mut resolver = StaticProfiteerResolver::new();
    for subject in subjects {
        let upline = [
            Participant::new("sponsor-ada", 1),
            Participant::new("mentor-bo", 2),
            Participant::new("leader-cy", 3),
            Participant::new("founder-di", 4),
        ];
        for participant in upline {
            resolver.push((*subject).clone(), RewardKind::Basic, participant);
        }
        resolver.push(
            (*subject).clone(),
            RewardKind::Extra,
            Participant::new("leader-cy", 3),
        );
        resolver.push(
            (*subject).clone(),
            RewardKind::Custom,
            Participant::new("partner-eve", 2).with_custom_share(120),
        );
    }
    resolver
}

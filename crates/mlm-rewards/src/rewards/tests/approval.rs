use super::common::*;
use crate::rewards::approval::RewardApprovalWorkflow;
use crate::rewards::domain::RewardStatus;
use crate::rewards::memory::MemoryRewardStore;
use crate::rewards::repository::RepositoryError;
use chrono::Duration;
use std::sync::Arc;

#[test]
fn approval_waits_for_delay_window() {
    let store = Arc::new(MemoryRewardStore::with_rewards(vec![pending_reward(
        "p-1",
        t0(),
    )]));
    let clock = clock();
    let workflow = RewardApprovalWorkflow::new(store.clone(), clock.clone(), settings(true));
    let query = store.query().status(RewardStatus::Pending);

    clock.set(t0() + Duration::hours(47));
    assert_eq!(
        workflow
            .approve_all(&query, Duration::hours(48))
            .expect("query runs"),
        0
    );
    assert_eq!(store.rewards()[0].status, RewardStatus::Pending);

    clock.set(t0() + Duration::hours(49));
    assert_eq!(
        workflow
            .approve_all(&query, Duration::hours(48))
            .expect("query runs"),
        1
    );
    let approved = &store.rewards()[0];
    assert_eq!(approved.status, RewardStatus::Approved);
    assert_eq!(approved.status_changed_at, Some(t0() + Duration::hours(49)));
}

#[test]
fn second_approval_pass_is_a_no_op() {
    let store = Arc::new(MemoryRewardStore::with_rewards(vec![
        pending_reward("p-1", t0()),
        pending_reward("p-2", t0()),
    ]));
    let clock = clock();
    clock.advance(Duration::days(3)).expect("clock in range");
    let workflow = RewardApprovalWorkflow::new(store.clone(), clock, settings(true));
    let query = store.query();

    assert_eq!(workflow.approve_due(&query).expect("query runs"), 2);
    assert_eq!(workflow.approve_due(&query).expect("query runs"), 0);
}

#[test]
fn denial_skips_rewards_already_settled() {
    let mut approved = pending_reward("p-1", t0());
    approved
        .approve(t0() + Duration::hours(50))
        .expect("pending reward approves");
    let store = Arc::new(MemoryRewardStore::with_rewards(vec![
        approved,
        pending_reward("p-2", t0()),
        pending_reward("p-3", t0() + Duration::hours(60)),
    ]));
    let clock = clock();
    clock.advance(Duration::hours(72)).expect("clock in range");
    let workflow = RewardApprovalWorkflow::new(store.clone(), clock, settings(true));

    let denied = workflow
        .deny_all(&store.query(), Duration::hours(48))
        .expect("query runs");

    assert_eq!(denied, 1);
    let statuses: Vec<_> = store.rewards().iter().map(|reward| reward.status).collect();
    assert_eq!(
        statuses,
        vec![
            RewardStatus::Approved,
            RewardStatus::Denied,
            RewardStatus::Pending
        ]
    );
}

#[test]
fn persistence_failure_skips_only_that_record() {
    let backing = MemoryRewardStore::with_rewards(vec![
        pending_reward("p-1", t0()),
        pending_reward("p-2", t0()),
        pending_reward("p-3", t0()),
    ]);
    let store = Arc::new(RejectingStore::rejecting(backing.clone(), &["p-2"]));
    let clock = clock();
    clock.advance(Duration::days(2)).expect("clock in range");
    let workflow = RewardApprovalWorkflow::new(store, clock, settings(true));

    let approved = workflow
        .approve_all(&backing.query(), Duration::hours(48))
        .expect("query runs");

    assert_eq!(approved, 2);
    let statuses: Vec<_> = backing.rewards().iter().map(|reward| reward.status).collect();
    assert_eq!(
        statuses,
        vec![
            RewardStatus::Approved,
            RewardStatus::Pending,
            RewardStatus::Approved
        ]
    );
}

#[test]
fn failing_query_is_reported() {
    let store = Arc::new(MemoryRewardStore::new());
    let workflow = RewardApprovalWorkflow::new(store, clock(), settings(true));

    match workflow.deny_all(&UnavailableQuery, Duration::zero()) {
        Err(RepositoryError::Unavailable(message)) => assert_eq!(message, "database offline"),
        other => panic!("expected unavailable error, got {other:?}"),
    }
}

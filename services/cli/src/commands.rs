use crate::infra::{parse_hours, parse_timestamp, print_json};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use mlm_rewards::config::AppConfig;
use mlm_rewards::error::AppError;
use mlm_rewards::rewards::{
    ledger, Clock, ManualClock, MemoryRewardStore, Pocket, RewardApprovalWorkflow,
    RewardGenerator, RewardQuery, RewardStatus, RewardSubject, RewardTransition, SubjectId,
    SystemClock,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct GenerateArgs {
    /// Reward ledger CSV; created when missing and rewritten in place
    #[arg(long)]
    pub(crate) ledger: PathBuf,
    /// Subject sheet CSV (subject_id, amount, basic, extra, custom)
    #[arg(long)]
    pub(crate) subjects: PathBuf,
    /// Profiteer sheet CSV (subject_id, kind, participant_id, tier, custom_share_bps)
    #[arg(long)]
    pub(crate) profiteers: PathBuf,
    /// Persist zero-valued rewards instead of skipping them
    #[arg(long)]
    pub(crate) keep_worthless: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TransitionArgs {
    /// Reward ledger CSV, rewritten in place
    #[arg(long)]
    pub(crate) ledger: PathBuf,
    /// Only consider rewards of this subject
    #[arg(long)]
    pub(crate) subject: Option<String>,
    /// Override the configured delay window
    #[arg(long = "delay-hours", value_parser = parse_hours)]
    pub(crate) delay: Option<Duration>,
    /// Evaluate the delay as of this RFC 3339 instant instead of now
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct SubjectGeneration {
    subject_id: SubjectId,
    generated: usize,
    value: u64,
}

#[derive(Debug, Serialize)]
struct GenerateSummary {
    generated: usize,
    subjects: Vec<SubjectGeneration>,
    ledger_size: usize,
}

#[derive(Debug, Serialize)]
struct TransitionSummary {
    transition: &'static str,
    query: String,
    delay_hours: i64,
    as_of: DateTime<Utc>,
    transitioned: usize,
    ledger_size: usize,
}

pub(crate) fn run_generate(args: GenerateArgs, config: &AppConfig) -> Result<(), AppError> {
    let store = Arc::new(MemoryRewardStore::with_rewards(ledger::read_ledger_path(
        &args.ledger,
    )?));
    let subjects = ledger::read_subjects_path(&args.subjects)?;
    let resolver = ledger::read_profiteers_path(&args.profiteers)?;

    let mut settings = config.rewards.clone();
    if args.keep_worthless {
        settings.skip_worthless = false;
    }

    let generator = RewardGenerator::new(
        store.clone(),
        store.clone(),
        Arc::new(resolver),
        Arc::new(SystemClock),
        settings,
        config.rates.clone(),
    );

    let mut pocket = Pocket::new();
    let mut entries = Vec::with_capacity(subjects.len());
    for subject in &subjects {
        let generated = generator.generate_all_into(subject, &mut pocket);
        let value: u64 = pocket.items().iter().map(|item| item.reward().value).sum();
        entries.push(SubjectGeneration {
            subject_id: subject.subject_id(),
            generated,
            value,
        });
    }

    let rewards = store.rewards();
    ledger::write_ledger_path(&args.ledger, &rewards)?;

    let generated: usize = entries.iter().map(|entry| entry.generated).sum();
    info!(generated, ledger = %args.ledger.display(), "ledger updated");

    print_json(&GenerateSummary {
        generated,
        subjects: entries,
        ledger_size: rewards.len(),
    })
}

pub(crate) fn run_transition(
    args: TransitionArgs,
    transition: RewardTransition,
    config: &AppConfig,
) -> Result<(), AppError> {
    let store = Arc::new(MemoryRewardStore::with_rewards(ledger::read_ledger_path(
        &args.ledger,
    )?));

    let clock: Arc<dyn Clock> = match args.now {
        Some(now) => Arc::new(ManualClock::new(now)),
        None => Arc::new(SystemClock),
    };
    let as_of = clock.now();

    let delay = match (args.delay, transition) {
        (Some(delay), _) => delay,
        (None, RewardTransition::Approve) => config.rewards.approval_delay,
        (None, RewardTransition::Deny) => config.rewards.denial_delay,
    };

    let mut query = store.query().status(RewardStatus::Pending);
    if let Some(subject) = args.subject {
        query = query.subject(SubjectId(subject));
    }

    let workflow = RewardApprovalWorkflow::new(store.clone(), clock, config.rewards.clone());
    let transitioned = match transition {
        RewardTransition::Approve => workflow.approve_all(&query, delay)?,
        RewardTransition::Deny => workflow.deny_all(&query, delay)?,
    };

    let rewards = store.rewards();
    ledger::write_ledger_path(&args.ledger, &rewards)?;

    print_json(&TransitionSummary {
        transition: transition.label(),
        query: query.describe(),
        delay_hours: delay.num_hours(),
        as_of,
        transitioned,
        ledger_size: rewards.len(),
    })
}

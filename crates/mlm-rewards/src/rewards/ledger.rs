//! CSV import/export of the reward ledger and of generation inputs.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Participant, ParticipantId, Reward, RewardId, RewardKind, RewardStatus, SubjectId,
    SubjectSnapshot,
};
use super::memory::StaticProfiteerResolver;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to access ledger file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid ledger CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("reward id {0} appears more than once in the ledger")]
    DuplicateId(u64),
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    id: Option<u64>,
    subject_id: String,
    participant_id: String,
    kind: RewardKind,
    value: u64,
    status: RewardStatus,
    created_at: DateTime<Utc>,
    status_changed_at: Option<DateTime<Utc>>,
}

impl From<LedgerRow> for Reward {
    fn from(row: LedgerRow) -> Self {
        Reward {
            id: row.id.map(RewardId),
            subject_id: SubjectId(row.subject_id),
            participant_id: ParticipantId(row.participant_id),
            kind: row.kind,
            value: row.value,
            status: row.status,
            created_at: row.created_at,
            status_changed_at: row.status_changed_at,
        }
    }
}

impl From<&Reward> for LedgerRow {
    fn from(reward: &Reward) -> Self {
        LedgerRow {
            id: reward.id.map(|id| id.0),
            subject_id: reward.subject_id.0.clone(),
            participant_id: reward.participant_id.0.clone(),
            kind: reward.kind,
            value: reward.value,
            status: reward.status,
            created_at: reward.created_at,
            status_changed_at: reward.status_changed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubjectRow {
    subject_id: String,
    amount: u64,
    #[serde(default)]
    basic: bool,
    #[serde(default)]
    extra: bool,
    #[serde(default)]
    custom: bool,
}

#[derive(Debug, Deserialize)]
struct ProfiteerRow {
    subject_id: String,
    kind: RewardKind,
    participant_id: String,
    tier: u8,
    #[serde(default)]
    custom_share_bps: Option<u32>,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub fn read_ledger<R: Read>(reader: R) -> Result<Vec<Reward>, LedgerError> {
    let mut seen = BTreeSet::new();
    let mut rewards = Vec::new();

    for row in csv_reader(reader).deserialize::<LedgerRow>() {
        let row = row?;
        if let Some(id) = row.id {
            if !seen.insert(id) {
                return Err(LedgerError::DuplicateId(id));
            }
        }
        rewards.push(Reward::from(row));
    }

    Ok(rewards)
}

/// Reads a ledger file; a missing file is an empty ledger.
pub fn read_ledger_path<P: AsRef<Path>>(path: P) -> Result<Vec<Reward>, LedgerError> {
    match File::open(path) {
        Ok(file) => read_ledger(file),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

pub fn write_ledger<W: Write>(writer: W, rewards: &[Reward]) -> Result<(), LedgerError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for reward in rewards {
        csv_writer.serialize(LedgerRow::from(reward))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_ledger_path<P: AsRef<Path>>(path: P, rewards: &[Reward]) -> Result<(), LedgerError> {
    let file = File::create(path)?;
    write_ledger(file, rewards)
}

pub fn read_subjects<R: Read>(reader: R) -> Result<Vec<SubjectSnapshot>, LedgerError> {
    let mut subjects = Vec::new();
    for row in csv_reader(reader).deserialize::<SubjectRow>() {
        let row = row?;
        subjects.push(SubjectSnapshot {
            id: SubjectId(row.subject_id),
            amount: row.amount,
            basic: row.basic,
            extra: row.extra,
            custom: row.custom,
        });
    }
    Ok(subjects)
}

pub fn read_subjects_path<P: AsRef<Path>>(path: P) -> Result<Vec<SubjectSnapshot>, LedgerError> {
    read_subjects(File::open(path)?)
}

/// Builds a resolver from profiteer rows, preserving file order per subject and kind.
pub fn read_profiteers<R: Read>(reader: R) -> Result<StaticProfiteerResolver, LedgerError> {
    let mut resolver = StaticProfiteerResolver::new();
    for row in csv_reader(reader).deserialize::<ProfiteerRow>() {
        let row = row?;
        let participant = Participant {
            id: ParticipantId(row.participant_id),
            tier: row.tier,
            custom_share_bps: row.custom_share_bps,
        };
        resolver.push(SubjectId(row.subject_id), row.kind, participant);
    }
    Ok(resolver)
}

pub fn read_profiteers_path<P: AsRef<Path>>(
    path: P,
) -> Result<StaticProfiteerResolver, LedgerError> {
    read_profiteers(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::repository::ProfiteerResolver;

    #[test]
    fn ledger_rows_survive_export_and_import() {
        let csv = "id,subject_id,participant_id,kind,value,status,created_at,status_changed_at\n\
1,order-1,p-1,basic,1000,approved,2025-03-01T08:00:00Z,2025-03-04T08:00:00Z\n\
2,order-1,p-2,extra,200,pending,2025-03-01T08:00:00Z,\n";

        let rewards = read_ledger(csv.as_bytes()).expect("ledger parses");
        assert_eq!(rewards.len(), 2);
        assert_eq!(rewards[0].status, RewardStatus::Approved);
        assert!(rewards[0].status_changed_at.is_some());
        assert_eq!(rewards[1].kind, RewardKind::Extra);
        assert!(rewards[1].status_changed_at.is_none());

        let mut out = Vec::new();
        write_ledger(&mut out, &rewards).expect("ledger writes");
        let reread = read_ledger(out.as_slice()).expect("written ledger parses");
        assert_eq!(reread, rewards);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let csv = "id,subject_id,participant_id,kind,value,status,created_at,status_changed_at\n\
4,order-1,p-1,basic,10,pending,2025-03-01T08:00:00Z,\n\
4,order-1,p-2,basic,10,pending,2025-03-01T08:00:00Z,\n";

        assert!(matches!(
            read_ledger(csv.as_bytes()),
            Err(LedgerError::DuplicateId(4))
        ));
    }

    #[test]
    fn profiteer_sheet_keeps_order_per_strategy() {
        let csv = "subject_id,kind,participant_id,tier,custom_share_bps\n\
order-1,basic,p-2,1,\n\
order-1,custom,p-9,3,150\n\
order-1,basic,p-1,2,\n";

        let resolver = read_profiteers(csv.as_bytes()).expect("profiteers parse");
        let subject = SubjectSnapshot::new("order-1", 1_000);

        let basic = resolver
            .profiteers(RewardKind::Basic, &subject)
            .expect("lookup");
        let ids: Vec<_> = basic.iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(ids, vec!["p-2", "p-1"]);

        let custom = resolver
            .profiteers(RewardKind::Custom, &subject)
            .expect("lookup");
        assert_eq!(custom[0].custom_share_bps, Some(150));
    }

    #[test]
    fn subject_sheet_defaults_missing_flags_to_false() {
        let csv = "subject_id,amount,basic\norder-7,5000,true\n";
        let subjects = read_subjects(csv.as_bytes()).expect("subjects parse");

        assert_eq!(
            subjects,
            vec![SubjectSnapshot::new("order-7", 5_000).rewardable_by(RewardKind::Basic)]
        );
    }
}

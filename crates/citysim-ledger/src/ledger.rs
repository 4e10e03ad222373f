//! The money ledger: an append-only log of every balance change.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Double-entry**: every transfer names a debited and a credited account.
//! - **Integer money**: amounts are `i64` and strictly positive.

use serde::Serialize;

use citysim_types::{FacilityName, JobName, TeamName};
use tracing::debug;

use crate::{LedgerError, TransactionBuilder};

// ---------------------------------------------------------------------------
// Accounts and kinds
// ---------------------------------------------------------------------------

/// One side of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Account {
    /// A team wallet.
    Team(TeamName),
    /// The scenario itself: source of opening balances and environment rewards.
    Environment,
    /// A shop's till.
    Shop(FacilityName),
    /// Sink for fines. Nothing is ever paid out of it.
    Penalty,
}

impl Account {
    /// The team, if this is a team account.
    pub fn team(&self) -> Option<&TeamName> {
        match self {
            Self::Team(team) => Some(team),
            Self::Environment | Self::Shop(_) | Self::Penalty => None,
        }
    }
}

impl core::fmt::Display for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Team(team) => write!(f, "team:{team}"),
            Self::Environment => f.write_str("environment"),
            Self::Shop(shop) => write!(f, "shop:{shop}"),
            Self::Penalty => f.write_str("penalty"),
        }
    }
}

/// Category of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EntryKind {
    /// A team's starting money.
    Opening,
    /// Items bought at a shop.
    Purchase,
    /// Reward (or winning bid) paid for a completed job.
    JobReward,
    /// Fine for an auction that was won but not delivered.
    Fine,
}

/// One recorded transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Position in the ledger.
    pub sequence: u64,
    /// Round the transfer happened in.
    pub round: u64,
    /// Category.
    pub kind: EntryKind,
    /// Debited account.
    pub from: Account,
    /// Credited account.
    pub to: Account,
    /// Amount moved, always positive.
    pub amount: i64,
    /// Job the transfer belongs to, if any.
    pub job: Option<JobName>,
}

/// Parameters for recording a general transfer.
#[derive(Debug, Clone)]
pub struct TransferParams {
    /// Round number.
    pub round: u64,
    /// Category.
    pub kind: EntryKind,
    /// Debited account.
    pub from: Account,
    /// Credited account.
    pub to: Account,
    /// Amount moved.
    pub amount: i64,
    /// Related job.
    pub job: Option<JobName>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The append-only money ledger of one match.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a transfer between two accounts.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_transfer(&mut self, params: TransferParams) -> Result<&LedgerEntry, LedgerError> {
        let sequence = u64::try_from(self.entries.len())
            .map_err(|_err| LedgerError::InternalError("ledger sequence overflow"))?;
        let mut builder = TransactionBuilder::new(params.round, params.kind)
            .from(params.from)
            .to(params.to)
            .amount(params.amount);
        if let Some(job) = params.job {
            builder = builder.job(job);
        }

        let entry = builder.build(sequence)?;
        debug!(
            round = entry.round,
            kind = ?entry.kind,
            from = %entry.from,
            to = %entry.to,
            amount = entry.amount,
            "ledger entry recorded"
        );
        self.entries.push(entry);

        self.entries
            .last()
            .ok_or(LedgerError::InternalError("failed to retrieve entry after append"))
    }

    /// Record a team's starting money. Zero balances record nothing.
    pub fn record_opening(
        &mut self,
        round: u64,
        team: &TeamName,
        amount: i64,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        self.record_transfer(TransferParams {
            round,
            kind: EntryKind::Opening,
            from: Account::Environment,
            to: Account::Team(team.clone()),
            amount,
            job: None,
        })?;
        Ok(())
    }

    /// Record a shop purchase.
    pub fn record_purchase(
        &mut self,
        round: u64,
        team: &TeamName,
        shop: &FacilityName,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.record_transfer(TransferParams {
            round,
            kind: EntryKind::Purchase,
            from: Account::Team(team.clone()),
            to: Account::Shop(shop.clone()),
            amount,
            job: None,
        })?;
        Ok(())
    }

    /// Record a job reward. `poster` is `None` for environment jobs.
    pub fn record_job_reward(
        &mut self,
        round: u64,
        job: &JobName,
        poster: Option<&TeamName>,
        deliverer: &TeamName,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.record_transfer(TransferParams {
            round,
            kind: EntryKind::JobReward,
            from: poster.map_or(Account::Environment, |team| Account::Team(team.clone())),
            to: Account::Team(deliverer.clone()),
            amount,
            job: Some(job.clone()),
        })?;
        Ok(())
    }

    /// Record an auction fine.
    pub fn record_fine(
        &mut self,
        round: u64,
        job: &JobName,
        team: &TeamName,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.record_transfer(TransferParams {
            round,
            kind: EntryKind::Fine,
            from: Account::Team(team.clone()),
            to: Account::Penalty,
            amount,
            job: Some(job.clone()),
        })?;
        Ok(())
    }

    /// Entries recorded in `round`.
    pub fn entries_for_round(&self, round: u64) -> Vec<&LedgerEntry> {
        self.entries.iter().filter(|e| e.round == round).collect()
    }

    /// All entries, in insertion order.
    pub fn all_entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Net amount credited to `account` minus the amount debited from it.
    pub fn account_balance(&self, account: &Account) -> Result<i64, LedgerError> {
        self.entries.iter().try_fold(0_i64, |balance, entry| {
            let mut balance = balance;
            if &entry.to == account {
                balance = balance
                    .checked_add(entry.amount)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
            }
            if &entry.from == account {
                balance = balance
                    .checked_sub(entry.amount)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
            }
            Ok(balance)
        })
    }

    /// The balance the ledger implies for a team.
    pub fn team_balance(&self, team: &str) -> Result<i64, LedgerError> {
        self.account_balance(&Account::Team(TeamName::from(team)))
    }
}

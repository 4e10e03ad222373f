//! Transaction builder and validation for the money ledger.
//!
//! Provides a [`TransactionBuilder`] that enforces the double-entry
//! invariant: every transfer names a debited and a credited account of the
//! right shape for its [`EntryKind`], and a strictly positive amount.

use citysim_types::JobName;

use crate::LedgerError;
use crate::ledger::{Account, EntryKind, LedgerEntry};

/// Builder for constructing validated [`LedgerEntry`] values.
///
/// # Examples
///
/// ```
/// use citysim_ledger::{Account, EntryKind, TransactionBuilder};
/// use citysim_types::{FacilityName, TeamName};
///
/// let entry = TransactionBuilder::new(4, EntryKind::Purchase)
///     .from(Account::Team(TeamName::from("A")))
///     .to(Account::Shop(FacilityName::from("shop1")))
///     .amount(75)
///     .build(0);
///
/// assert!(entry.is_ok());
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    round: u64,
    kind: EntryKind,
    from: Option<Account>,
    to: Option<Account>,
    amount: Option<i64>,
    job: Option<JobName>,
}

impl TransactionBuilder {
    /// Start building an entry of `kind` in `round`.
    pub const fn new(round: u64, kind: EntryKind) -> Self {
        Self {
            round,
            kind,
            from: None,
            to: None,
            amount: None,
            job: None,
        }
    }

    /// Set the debited account.
    #[must_use]
    pub fn from(mut self, account: Account) -> Self {
        self.from = Some(account);
        self
    }

    /// Set the credited account.
    #[must_use]
    pub fn to(mut self, account: Account) -> Self {
        self.to = Some(account);
        self
    }

    /// Set the amount moved.
    #[must_use]
    pub const fn amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Link the entry to a job.
    #[must_use]
    pub fn job(mut self, job: JobName) -> Self {
        self.job = Some(job);
        self
    }

    /// Validate inputs and produce a [`LedgerEntry`] at position `sequence`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if a side or the amount is unset,
    /// [`LedgerError::NonPositiveAmount`] for zero or negative amounts, and
    /// [`LedgerError::InvalidAccount`] when an account does not fit the kind.
    pub fn build(self, sequence: u64) -> Result<LedgerEntry, LedgerError> {
        let from = self.from.ok_or(LedgerError::MissingField("from"))?;
        let to = self.to.ok_or(LedgerError::MissingField("to"))?;
        let amount = self.amount.ok_or(LedgerError::MissingField("amount"))?;

        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount { amount });
        }
        validate_accounts(self.kind, &from, &to)?;

        Ok(LedgerEntry {
            sequence,
            round: self.round,
            kind: self.kind,
            from,
            to,
            amount,
            job: self.job,
        })
    }
}

/// Check both sides against the shape each kind requires.
fn validate_accounts(kind: EntryKind, from: &Account, to: &Account) -> Result<(), LedgerError> {
    let from_ok = match kind {
        EntryKind::Opening => matches!(from, Account::Environment),
        EntryKind::Purchase | EntryKind::Fine => matches!(from, Account::Team(_)),
        EntryKind::JobReward => matches!(from, Account::Team(_) | Account::Environment),
    };
    if !from_ok {
        return Err(LedgerError::InvalidAccount {
            kind,
            side: "from",
            actual: from.to_string(),
        });
    }

    let to_ok = match kind {
        EntryKind::Opening | EntryKind::JobReward => matches!(to, Account::Team(_)),
        EntryKind::Purchase => matches!(to, Account::Shop(_)),
        EntryKind::Fine => matches!(to, Account::Penalty),
    };
    if !to_ok {
        return Err(LedgerError::InvalidAccount {
            kind,
            side: "to",
            actual: to.to_string(),
        });
    }

    if from == to {
        return Err(LedgerError::InvalidAccount {
            kind,
            side: "to",
            actual: to.to_string(),
        });
    }

    Ok(())
}

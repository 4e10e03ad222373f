//! Money ledger and balance reconciliation for the CitySim scenario engine.
//!
//! Every change to a team's balance is recorded in this ledger as a transfer
//! between two accounts. Money enters the match from the environment (opening
//! balances, environment job rewards) and leaves it into shops (purchases)
//! and the penalty sink (auction fines). Between teams it only moves through
//! team-posted job rewards.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`Ledger`] struct: append-only log with recording methods.
//! - [`transaction`] -- The [`TransactionBuilder`] for validated entry construction.
//! - [`reconcile`] -- Per-team balance reconciliation against live wallets.
//!
//! # Entry kinds
//!
//! | Kind | From (debit) | To (credit) |
//! |------|-------------|-------------|
//! | Opening | Environment | Team |
//! | Purchase | Team | Shop |
//! | JobReward | Team or Environment | Team |
//! | Fine | Team | Penalty |
//!
//! # Usage
//!
//! ```
//! use citysim_ledger::Ledger;
//! use citysim_types::{FacilityName, TeamName};
//!
//! let mut ledger = Ledger::new();
//! let team = TeamName::from("A");
//!
//! ledger.record_opening(0, &team, 500).ok();
//! ledger.record_purchase(3, &team, &FacilityName::from("shop1"), 120).ok();
//!
//! assert_eq!(ledger.team_balance("A"), Ok(380));
//! ```

pub mod ledger;
pub mod reconcile;
pub mod transaction;

// Re-export primary types at crate root.
pub use ledger::{Account, EntryKind, Ledger, LedgerEntry, TransferParams};
pub use reconcile::{BalanceMismatch, ReconcileResult, reconcile};
pub use transaction::TransactionBuilder;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording or summing ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Amounts must be strictly positive.
    #[error("ledger entry amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The invalid amount.
        amount: i64,
    },

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The from/to accounts do not match the entry kind.
    #[error("invalid {side} account for {kind:?}: got {actual}")]
    InvalidAccount {
        /// The entry kind being validated.
        kind: EntryKind,
        /// Which side of the entry ("from" or "to").
        side: &'static str,
        /// The account that was supplied.
        actual: String,
    },

    /// Summing entries overflowed.
    #[error("arithmetic overflow while summing ledger entries")]
    ArithmeticOverflow,

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}

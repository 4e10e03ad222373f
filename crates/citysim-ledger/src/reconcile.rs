//! Balance reconciliation between the ledger and live team wallets.
//!
//! Team wallets are mutated directly by the resolver and every mutation is
//! recorded in the ledger. At the end of each round the balance implied by
//! the ledger must equal the wallet of every team. A difference means some
//! code path moved money without recording it.

use std::collections::BTreeMap;

use citysim_types::TeamName;

use crate::ledger::Ledger;

/// A team whose wallet disagrees with the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceMismatch {
    /// Round the check ran in.
    pub round: u64,
    /// Per-team (`wallet`, `ledger`) pairs that differ.
    pub teams: BTreeMap<TeamName, (i64, i64)>,
    /// Human-readable description.
    pub message: String,
}

impl core::fmt::Display for BalanceMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileResult {
    /// Every wallet matches the ledger.
    Balanced,
    /// At least one team differs.
    Mismatch(BalanceMismatch),
}

/// Compare every team wallet in `wallets` with the ledger.
pub fn reconcile(round: u64, ledger: &Ledger, wallets: &BTreeMap<TeamName, i64>) -> ReconcileResult {
    let mut teams = BTreeMap::new();
    for (team, wallet) in wallets {
        match ledger.team_balance(team.as_str()) {
            Ok(recorded) if recorded == *wallet => {}
            Ok(recorded) => {
                teams.insert(team.clone(), (*wallet, recorded));
            }
            // An overflowing sum can never match a wallet.
            Err(_overflow) => {
                teams.insert(team.clone(), (*wallet, i64::MIN));
            }
        }
    }

    if teams.is_empty() {
        ReconcileResult::Balanced
    } else {
        let count = teams.len();
        ReconcileResult::Mismatch(BalanceMismatch {
            round,
            teams,
            message: format!("ledger mismatch at round {round}: {count} team wallet(s) disagree"),
        })
    }
}

//! Team wallets and rosters.

use std::collections::BTreeSet;

use citysim_types::{AgentName, TeamName};
use tracing::debug;

use crate::error::AgentError;

/// A team: a shared wallet and its member entities.
///
/// Money is signed. Purchases and job postings are checked against what
/// the team can spend, but fines are charged regardless and may push the
/// balance below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Team name.
    pub name: TeamName,
    /// Current balance.
    pub money: i64,
    /// Member entities.
    pub members: BTreeSet<AgentName>,
}

impl Team {
    /// A team with no members.
    pub const fn new(name: TeamName, money: i64) -> Self {
        Self {
            name,
            money,
            members: BTreeSet::new(),
        }
    }

    /// Register a member.
    pub fn add_member(&mut self, agent: AgentName) -> Result<(), AgentError> {
        if self.members.contains(&agent) {
            return Err(AgentError::DuplicateAgent(agent));
        }
        self.members.insert(agent);
        Ok(())
    }

    /// Add money.
    pub fn credit(&mut self, amount: i64) -> Result<(), AgentError> {
        self.money = self
            .money
            .checked_add(amount)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: format!("credit {amount} to team {}", self.name),
            })?;
        Ok(())
    }

    /// Take money. The balance may become negative.
    pub fn debit(&mut self, amount: i64) -> Result<(), AgentError> {
        self.money = self
            .money
            .checked_sub(amount)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: format!("debit {amount} from team {}", self.name),
            })?;
        if self.money < 0 {
            debug!(team = %self.name, money = self.money, "team balance is negative");
        }
        Ok(())
    }
}

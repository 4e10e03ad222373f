//! Jobs and auctions: the contracts of the match economy.
//!
//! A [`Job`] asks for a bundle of items at a storage and pays a reward on
//! completion. An auction is a job with an [`Auction`] payload: before it
//! opens for deliveries, teams bid the price they would accept, and the
//! lowest bid wins the exclusive right to deliver.
//!
//! # Lifecycle
//!
//! ```text
//! Posted --start--> Active ------------------> Completed
//!    |                 \---------end---------> Expired
//!    \--start--> Auctioning --window closes--> Active (lowest bidder assigned)
//!                          \--no bids--------> Expired
//! ```
//!
//! Delivery progress is kept per team; a job completes for the first team
//! whose deliveries cover every requested item.

use std::collections::BTreeMap;

use citysim_types::{
    ActionResultCode, FacilityName, ItemName, JobName, JobStatus, TeamName, VisibleAuction,
    VisibleJob,
};

/// Parameters of a job before it is registered and named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Posting team, `None` for environment jobs.
    pub poster: Option<TeamName>,
    /// Storage the items must be delivered to.
    pub storage: FacilityName,
    /// Items requested.
    pub required: BTreeMap<ItemName, u32>,
    /// Reward paid on completion.
    pub reward: i64,
    /// First round the job is open.
    pub start: u64,
    /// Last round the job is open.
    pub end: u64,
    /// Present for auctions.
    pub auction: Option<AuctionSpec>,
}

/// Auction parameters of a [`JobSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionSpec {
    /// Rounds of bidding, starting at the job's start round.
    pub auction_time: u64,
    /// Fine charged to an assignee that fails to deliver.
    pub fine: i64,
    /// Highest acceptable bid.
    pub max_bid: i64,
}

/// Bidding state of an auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auction {
    /// Rounds of bidding, starting at the job's start round.
    pub auction_time: u64,
    /// Fine charged to an assignee that fails to deliver.
    pub fine: i64,
    /// Highest acceptable bid.
    pub max_bid: i64,
    lowest_bid: Option<i64>,
    bidder: Option<TeamName>,
}

impl Auction {
    /// The currently winning bid.
    pub const fn lowest_bid(&self) -> Option<i64> {
        self.lowest_bid
    }

    /// The team holding the winning bid.
    pub const fn bidder(&self) -> Option<&TeamName> {
        self.bidder.as_ref()
    }
}

/// How a job expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    /// Nobody owes anything.
    Plain,
    /// An assigned auction was not delivered.
    Fined {
        /// The assignee.
        team: TeamName,
        /// The fine it owes.
        fine: i64,
    },
}

/// A registered job or auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Job name.
    pub name: JobName,
    /// Posting team, `None` for environment jobs.
    pub poster: Option<TeamName>,
    /// Storage the items must be delivered to.
    pub storage: FacilityName,
    /// Items requested.
    pub required: BTreeMap<ItemName, u32>,
    /// Nominal reward.
    pub reward: i64,
    /// First round the job is open.
    pub start: u64,
    /// Last round the job is open.
    pub end: u64,
    status: JobStatus,
    progress: BTreeMap<TeamName, BTreeMap<ItemName, u32>>,
    auction: Option<Auction>,
}

impl Job {
    /// Register `spec` under `name`, in [`JobStatus::Posted`].
    pub fn new(name: JobName, spec: JobSpec) -> Self {
        Self {
            name,
            poster: spec.poster,
            storage: spec.storage,
            required: spec.required,
            reward: spec.reward,
            start: spec.start,
            end: spec.end,
            status: JobStatus::Posted,
            progress: BTreeMap::new(),
            auction: spec.auction.map(|a| Auction {
                auction_time: a.auction_time,
                fine: a.fine,
                max_bid: a.max_bid,
                lowest_bid: None,
                bidder: None,
            }),
        }
    }

    /// Current lifecycle state.
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// The auction payload, if this is an auction.
    pub const fn auction(&self) -> Option<&Auction> {
        self.auction.as_ref()
    }

    /// Whether this is an auction.
    pub const fn is_auction(&self) -> bool {
        self.auction.is_some()
    }

    /// Last round in which bids are accepted, for auctions.
    pub fn bidding_until(&self) -> Option<u64> {
        self.auction.as_ref().map(|a| {
            self.start
                .saturating_add(a.auction_time)
                .saturating_sub(1)
        })
    }

    /// Whether agents see the job in their percepts.
    pub const fn is_visible(&self) -> bool {
        matches!(self.status, JobStatus::Active | JobStatus::Auctioning)
    }

    /// Amount paid to the deliverer: the winning bid for auctions, else the
    /// reward.
    pub fn payout(&self) -> i64 {
        self.auction
            .as_ref()
            .and_then(|a| a.lowest_bid)
            .unwrap_or(self.reward)
    }

    /// Items `team` has delivered so far.
    pub fn delivered_by(&self, team: &str) -> BTreeMap<ItemName, u32> {
        self.progress.get(team).cloned().unwrap_or_default()
    }

    /// Units of `item` `team` still has to deliver.
    pub fn outstanding(&self, team: &str, item: &str) -> u32 {
        let required = self.required.get(item).copied().unwrap_or(0);
        let delivered = self
            .progress
            .get(team)
            .and_then(|p| p.get(item))
            .copied()
            .unwrap_or(0);
        required.saturating_sub(delivered)
    }

    /// Advance through time-driven transitions at the start of `round`.
    ///
    /// Returns the new status if it changed.
    pub fn activate(&mut self, round: u64) -> Option<JobStatus> {
        let before = self.status;
        loop {
            let next = match (self.status, &self.auction) {
                (JobStatus::Posted, None) if self.start <= round => JobStatus::Active,
                (JobStatus::Posted, Some(_)) if self.start <= round => JobStatus::Auctioning,
                (JobStatus::Auctioning, Some(auction))
                    if self.start.saturating_add(auction.auction_time) <= round =>
                {
                    if auction.bidder.is_some() {
                        JobStatus::Active
                    } else {
                        JobStatus::Expired
                    }
                }
                _ => break,
            };
            self.status = next;
        }
        (self.status != before).then_some(self.status)
    }

    /// Place a sealed bid for `team`.
    ///
    /// Returns whether the bid became the lowest. Bids above the ceiling or
    /// not strictly below the current lowest are accepted as actions but do
    /// not change the auction.
    pub fn place_bid(&mut self, team: &TeamName, amount: i64) -> Result<bool, ActionResultCode> {
        let status = self.status;
        let auction = self.auction.as_mut().ok_or(ActionResultCode::FailedJobType)?;
        if status != JobStatus::Auctioning {
            return Err(ActionResultCode::FailedJobStatus);
        }
        if amount > auction.max_bid || auction.lowest_bid.is_some_and(|low| amount >= low) {
            return Ok(false);
        }
        auction.lowest_bid = Some(amount);
        auction.bidder = Some(team.clone());
        Ok(true)
    }

    /// Check that `team` may deliver to this job.
    pub fn check_deliverable(&self, team: &TeamName) -> Result<(), ActionResultCode> {
        if self.status != JobStatus::Active || self.poster.as_ref() == Some(team) {
            return Err(ActionResultCode::FailedJobStatus);
        }
        if let Some(auction) = &self.auction {
            if auction.bidder.as_ref() != Some(team) {
                return Err(ActionResultCode::FailedJobStatus);
            }
        }
        Ok(())
    }

    /// Record items `team` delivered. Completes the job and returns `true`
    /// once the team's deliveries cover every requirement.
    pub fn record_delivery(&mut self, team: &TeamName, items: &BTreeMap<ItemName, u32>) -> bool {
        let progress = self.progress.entry(team.clone()).or_default();
        for (item, amount) in items {
            let entry = progress.entry(item.clone()).or_insert(0);
            *entry = entry.saturating_add(*amount);
        }
        let done = self
            .required
            .iter()
            .all(|(item, need)| progress.get(item).copied().unwrap_or(0) >= *need);
        if done {
            self.status = JobStatus::Completed;
        }
        done
    }

    /// Expire the job if its end round has been reached.
    pub fn expire(&mut self, round: u64) -> Option<Expiry> {
        if self.status.is_terminal() || self.end > round {
            return None;
        }
        let was_active = self.status == JobStatus::Active;
        self.status = JobStatus::Expired;
        // Only an assignee that was free to deliver can be fined.
        let fined = self.auction.as_ref().filter(|_| was_active).and_then(|a| {
            a.bidder
                .as_ref()
                .filter(|_| a.fine > 0)
                .map(|team| Expiry::Fined {
                    team: team.clone(),
                    fine: a.fine,
                })
        });
        Some(fined.unwrap_or(Expiry::Plain))
    }

    /// What a member of `team` sees of this job.
    pub fn view_for(&self, team: &TeamName) -> VisibleJob {
        VisibleJob {
            name: self.name.clone(),
            storage: self.storage.clone(),
            poster: self.poster.clone(),
            required: self.required.clone(),
            delivered_by_you: self.delivered_by(team.as_str()),
            reward: self.reward,
            start: self.start,
            end: self.end,
            auction: self.auction.as_ref().map(|a| VisibleAuction {
                max_bid: a.max_bid,
                fine: a.fine,
                bidding_until: self.bidding_until().unwrap_or(self.start),
                assigned_to_you: a.bidder.as_ref() == Some(team),
            }),
        }
    }
}

//! Configuration loading and typed config structures for a CitySim match.
//!
//! The canonical configuration lives in `citysim-config.yaml` in the working
//! directory. It has two sections:
//!
//! - `server`: how the match is run (round count, pacing, team roster).
//! - `match`: the scenario itself (seed, map, roles, items, facilities,
//!   environment jobs, and economy knobs).
//!
//! Every field has a default, so partial files are accepted. Names are kept
//! as plain strings here and turned into typed names when the world is built.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use citysim_world::MapBounds;

/// Environment variable that replaces `match.seed`.
pub const SEED_ENV_VAR: &str = "CITYSIM_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for environment variable {var}")]
    InvalidEnv {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `citysim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CitySimConfig {
    /// How the match is run.
    #[serde(default)]
    pub server: ServerConfig,

    /// The scenario.
    #[serde(default, rename = "match")]
    pub match_config: MatchConfig,
}

impl CitySimConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if `CITYSIM_SEED` is not a number.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    ///
    /// Environment overrides apply either way.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `CITYSIM_SEED` if it is set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(SEED_ENV_VAR) {
            self.match_config.seed = value.trim().parse().map_err(|_err| ConfigError::InvalidEnv {
                var: SEED_ENV_VAR,
                value: value.clone(),
            })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Server section
// ---------------------------------------------------------------------------

/// How a match is run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Number of rounds in the match.
    #[serde(default = "default_rounds")]
    pub rounds: u64,

    /// Real-time milliseconds to wait between rounds.
    #[serde(default)]
    pub round_interval_ms: u64,

    /// Real-time milliseconds agents have to decide each round. Slower
    /// answers are replaced by `skip` for everyone.
    #[serde(default = "default_decision_budget_ms")]
    pub decision_budget_ms: u64,

    /// Teams taking part.
    #[serde(default)]
    pub teams: Vec<TeamConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            round_interval_ms: 0,
            decision_budget_ms: default_decision_budget_ms(),
            teams: Vec::new(),
        }
    }
}

/// One team and its agents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamConfig {
    /// Team name.
    pub name: String,
    /// The team's agents.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

/// One agent in a team roster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentConfig {
    /// Agent name, unique across the match.
    pub name: String,
    /// Name of a role from `match.roles`.
    pub role: String,
}

// ---------------------------------------------------------------------------
// Match section
// ---------------------------------------------------------------------------

/// The scenario of one match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchConfig {
    /// Seed of the match random source.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Map rectangle; agents spawn uniformly inside it.
    #[serde(default)]
    pub map: MapBounds,

    /// Coordinate distance of one unit of role speed.
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,

    /// Money every team starts with.
    #[serde(default = "default_starting_money")]
    pub starting_money: i64,

    /// Battery used per round of travel.
    #[serde(default = "default_goto_cost")]
    pub goto_cost: u32,

    /// Smallest charge a `recharge` adds.
    #[serde(default = "default_recharge_min")]
    pub recharge_min: u32,

    /// Largest charge a `recharge` adds.
    #[serde(default = "default_recharge_max")]
    pub recharge_max: u32,

    /// Percentage of actions that fail at random before they apply.
    #[serde(default)]
    pub random_fail_pct: u8,

    /// Roles by name.
    #[serde(default)]
    pub roles: BTreeMap<String, RoleConfig>,

    /// The item catalog, in the order agents see it.
    #[serde(default)]
    pub items: Vec<ItemConfig>,

    /// Shops.
    #[serde(default)]
    pub shops: Vec<ShopConfig>,

    /// Storages.
    #[serde(default)]
    pub storages: Vec<StorageConfig>,

    /// Workshops.
    #[serde(default)]
    pub workshops: Vec<PlaceConfig>,

    /// Dumps.
    #[serde(default)]
    pub dumps: Vec<PlaceConfig>,

    /// Charging stations.
    #[serde(default)]
    pub charging_stations: Vec<ChargingStationConfig>,

    /// Resource nodes.
    #[serde(default)]
    pub resource_nodes: Vec<ResourceNodeConfig>,

    /// Jobs posted by the environment.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            map: MapBounds::default(),
            cell_size: default_cell_size(),
            starting_money: default_starting_money(),
            goto_cost: default_goto_cost(),
            recharge_min: default_recharge_min(),
            recharge_max: default_recharge_max(),
            random_fail_pct: 0,
            roles: BTreeMap::new(),
            items: Vec::new(),
            shops: Vec::new(),
            storages: Vec::new(),
            workshops: Vec::new(),
            dumps: Vec::new(),
            charging_stations: Vec::new(),
            resource_nodes: Vec::new(),
            jobs: Vec::new(),
        }
    }
}

/// Limits of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RoleConfig {
    /// Cells per round.
    pub speed: u64,
    /// Load capacity in volume units.
    pub load: u32,
    /// Maximum battery.
    pub battery: u32,
}

/// One catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemConfig {
    /// Item name.
    pub name: String,
    /// Volume per unit.
    pub volume: u32,
    /// Items consumed by assembly.
    #[serde(default)]
    pub required_items: BTreeMap<String, u32>,
    /// Tools needed by assembly.
    #[serde(default)]
    pub required_tools: Vec<String>,
}

/// A facility with no payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceConfig {
    /// Facility name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

/// A shop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopConfig {
    /// Facility name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Rounds between restocks; 0 disables restocking.
    #[serde(default)]
    pub restock_interval: u64,
    /// Offered items.
    #[serde(default)]
    pub offers: Vec<ShopOfferConfig>,
}

/// One item a shop sells.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShopOfferConfig {
    /// Item name.
    pub item: String,
    /// Price per unit.
    pub price: i64,
    /// Units in stock at match start.
    pub stock: u32,
    /// Restock ceiling; defaults to the starting stock.
    #[serde(default)]
    pub max_stock: Option<u32>,
}

/// A storage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageConfig {
    /// Facility name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Volume capacity.
    pub capacity: u32,
}

/// A charging station.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChargingStationConfig {
    /// Facility name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Battery added per `charge`.
    pub rate: u32,
}

/// A resource node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceNodeConfig {
    /// Facility name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Item yielded.
    pub resource: String,
    /// Per-attempt success chance in `(0, 1)`.
    #[serde(default = "default_gather_probability")]
    pub gather_probability: f64,
}

/// A job posted by the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobConfig {
    /// Target storage.
    pub storage: String,
    /// Reward on completion.
    pub reward: i64,
    /// First round the job is open.
    pub start: u64,
    /// Last round the job is open.
    pub end: u64,
    /// Items requested.
    pub required: BTreeMap<String, u32>,
    /// Present for auctions.
    #[serde(default)]
    pub auction: Option<AuctionConfig>,
}

/// Auction parameters of an environment job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AuctionConfig {
    /// Rounds of bidding, starting at the job's start round.
    pub auction_time: u64,
    /// Fine charged to an assignee that fails to deliver.
    pub fine: i64,
    /// Highest acceptable bid; defaults to the reward.
    #[serde(default)]
    pub max_bid: Option<i64>,
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_rounds() -> u64 {
    1000
}

const fn default_decision_budget_ms() -> u64 {
    4000
}

const fn default_seed() -> u64 {
    17
}

const fn default_cell_size() -> f64 {
    0.001
}

const fn default_starting_money() -> i64 {
    50_000
}

const fn default_goto_cost() -> u32 {
    10
}

const fn default_recharge_min() -> u32 {
    1
}

const fn default_recharge_max() -> u32 {
    5
}

const fn default_gather_probability() -> f64 {
    0.5
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CitySimConfig::default();
        assert_eq!(config.server.rounds, 1000);
        assert_eq!(config.match_config.seed, 17);
        assert_eq!(config.match_config.goto_cost, 10);
        assert_eq!(config.match_config.random_fail_pct, 0);
        assert!(config.server.teams.is_empty());
    }

    #[test]
    fn parse_partial_yaml_fills_defaults() {
        let yaml = r"
server:
  rounds: 50
  teams:
    - name: A
      agents:
        - { name: agentA1, role: car }
match:
  roles:
    car: { speed: 3, load: 500, battery: 250 }
  items:
    - { name: item0, volume: 5 }
    - name: item1
      volume: 10
      required_items: { item0: 2 }
      required_tools: [item0]
  resource_nodes:
    - { name: node0, lat: 51.5, lon: -0.1, resource: item0 }
";
        let config: CitySimConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.server.rounds, 50);
        assert_eq!(config.server.round_interval_ms, 0);
        assert_eq!(config.server.decision_budget_ms, 4000);
        assert_eq!(config.server.teams.len(), 1);
        let m = &config.match_config;
        assert_eq!(m.roles.get("car").map(|r| r.load), Some(500));
        assert_eq!(m.items.len(), 2);
        assert_eq!(m.items.get(1).unwrap().required_items.get("item0"), Some(&2));
        assert!((m.resource_nodes.first().unwrap().gather_probability - 0.5).abs() < f64::EPSILON);
        assert_eq!(m.starting_money, 50_000);
    }

    #[test]
    fn parse_auction_job() {
        let yaml = r"
match:
  jobs:
    - storage: storage0
      reward: 999
      start: 3
      end: 9
      required: { item0: 1 }
      auction: { auction_time: 2, fine: 888 }
";
        let config: CitySimConfig = serde_yml::from_str(yaml).unwrap();
        let job = config.match_config.jobs.first().unwrap();
        let auction = job.auction.unwrap();
        assert_eq!(auction.fine, 888);
        assert_eq!(auction.max_bid, None);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(serde_yml::from_str::<CitySimConfig>("server: [").is_err());
    }
}

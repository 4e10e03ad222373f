//! Match server binary for the CitySim scenario engine.
//!
//! Loads a scenario and plays one match from the first round to the last.
//! Agent connections live behind the `DecisionSource` seam; this binary
//! plugs in the skip source, so every agent idles and the match exercises
//! the job calendar, shop restocks, and auction expiry on their own.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `citysim-config.yaml` (or `CITYSIM_CONFIG`)
//! 3. Run the match
//! 4. Log the result

mod error;

use std::path::PathBuf;

use citysim_core::CitySimConfig;
use citysim_core::decision::SkipDecisionSource;
use citysim_core::runner;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default scenario file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "citysim-config.yaml";

/// Environment variable overriding the scenario file path.
const CONFIG_PATH_ENV_VAR: &str = "CITYSIM_CONFIG";

/// Application entry point for the match server.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the match fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("citysim-engine starting");

    // 2. Load configuration.
    let config = load_config(std::env::var(CONFIG_PATH_ENV_VAR).ok())?;
    info!(
        seed = config.match_config.seed,
        rounds = config.server.rounds,
        teams = config.server.teams.len(),
        round_interval_ms = config.server.round_interval_ms,
        "Configuration loaded"
    );

    // 3. Run the match.
    let mut decision_source = SkipDecisionSource::new();
    let result = runner::run_match(&config, &mut decision_source)
        .await
        .map_err(EngineError::from)?;

    // 4. Log the result.
    runner::log_match_end(&result);
    for (team, rank) in &result.ranking {
        let score = result.scores.get(team).copied().unwrap_or_default();
        info!(team = %team, rank, score, "Final standing");
    }

    Ok(())
}

/// Load the scenario from `path_override` or `citysim-config.yaml`.
///
/// A missing file falls back to the built-in defaults.
fn load_config(path_override: Option<String>) -> Result<CitySimConfig, EngineError> {
    let path = path_override.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
    }
    CitySimConfig::load_or_default(&path).map_err(EngineError::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let config = load_config(Some("does-not-exist.yaml".to_owned())).unwrap();
        assert_eq!(config.server.rounds, 1000);
        assert!(config.server.teams.is_empty());
    }

    #[test]
    fn project_scenario_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(DEFAULT_CONFIG_PATH);
        if path.exists() {
            let config = load_config(Some(path.display().to_string())).unwrap();
            assert_eq!(config.server.teams.len(), 2);
        }
    }

    #[tokio::test]
    async fn skip_match_over_the_project_scenario() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(DEFAULT_CONFIG_PATH);
        if !path.exists() {
            return;
        }
        let mut config = load_config(Some(path.display().to_string())).unwrap();
        config.server.rounds = 60;
        config.server.round_interval_ms = 0;
        let result = runner::run_match(&config, &mut SkipDecisionSource::new()).await.unwrap();
        assert_eq!(result.rounds_played, 60);
        // Nobody delivers, so everybody keeps the starting money.
        assert_eq!(result.ranking.values().copied().collect::<Vec<_>>(), vec![1, 1]);
    }
}

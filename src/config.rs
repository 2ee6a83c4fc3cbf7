//! Application-level configuration: rule limits, timing, and the set targets
//! advertised to scoreboard clients.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::match_state::RuleLimits;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SIDEOUT_BACK_CONFIG_PATH";

/// Delay between entering pre-serve and the automatic advance to the serve.
const DEFAULT_SERVE_AUTO_ADVANCE_MS: u64 = 1_500;
/// Display duration of a timeout countdown. Presentational only.
const DEFAULT_TIMEOUT_SECONDS: u16 = 30;
/// Points to win a regular set.
const DEFAULT_SET_TARGET: u16 = 25;
/// Points to win the deciding set.
const DEFAULT_DECIDING_SET_TARGET: u16 = 15;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Per-set rule bounds seeded into every new [`MatchState`].
    ///
    /// [`MatchState`]: crate::state::match_state::MatchState
    pub limits: RuleLimits,
    /// Milliseconds between pre-serve and the automatic serve advance.
    pub serve_auto_advance_ms: u64,
    /// Seconds shown on the timeout countdown.
    pub timeout_seconds: u16,
    /// Points required to win a regular set (win by two applies externally).
    pub set_target_points: u16,
    /// Points required to win the deciding set.
    pub deciding_set_target_points: u16,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in FIVB defaults on any problem.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded match configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// The serve auto-advance delay as a [`Duration`].
    pub fn serve_auto_advance(&self) -> Duration {
        Duration::from_millis(self.serve_auto_advance_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            limits: RuleLimits::default(),
            serve_auto_advance_ms: DEFAULT_SERVE_AUTO_ADVANCE_MS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            set_target_points: DEFAULT_SET_TARGET,
            deciding_set_target_points: DEFAULT_DECIDING_SET_TARGET,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file. Every field is optional so
/// deployments only override what they need.
struct RawConfig {
    substitutions_per_set: Option<u8>,
    timeouts_per_set: Option<u8>,
    challenges_per_set: Option<u8>,
    serve_auto_advance_ms: Option<u64>,
    timeout_seconds: Option<u16>,
    set_target_points: Option<u16>,
    deciding_set_target_points: Option<u16>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let default_limits = RuleLimits::default();
        Self {
            limits: RuleLimits {
                substitutions: raw
                    .substitutions_per_set
                    .unwrap_or(default_limits.substitutions),
                timeouts: raw.timeouts_per_set.unwrap_or(default_limits.timeouts),
                challenges: raw.challenges_per_set.unwrap_or(default_limits.challenges),
            },
            serve_auto_advance_ms: raw
                .serve_auto_advance_ms
                .unwrap_or(defaults.serve_auto_advance_ms),
            timeout_seconds: raw.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            set_target_points: raw.set_target_points.unwrap_or(defaults.set_target_points),
            deciding_set_target_points: raw
                .deciding_set_target_points
                .unwrap_or(defaults.deciding_set_target_points),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fivb_rules() {
        let config = AppConfig::default();
        assert_eq!(config.limits.substitutions, 6);
        assert_eq!(config.limits.timeouts, 2);
        assert_eq!(config.limits.challenges, 2);
        assert_eq!(config.set_target_points, 25);
        assert_eq!(config.deciding_set_target_points, 15);
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"timeouts_per_set": 3, "serve_auto_advance_ms": 500}"#)
                .expect("valid raw config");
        let config: AppConfig = raw.into();
        assert_eq!(config.limits.timeouts, 3);
        assert_eq!(config.serve_auto_advance_ms, 500);
        assert_eq!(config.limits.substitutions, 6);
        assert_eq!(config.timeout_seconds, 30);
    }
}

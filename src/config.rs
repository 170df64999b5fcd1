//! Reconstructor configuration.
//!
//! Loaded from a JSON file and/or built from CLI flags. All checks happen
//! at construction: a bad configuration aborts startup and never surfaces
//! as a per-transaction failure.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown strategy '{0}', expected 'continuous' or 'exact'")]
    UnknownStrategy(String),
    #[error("denomination must be a positive integer, got {0}")]
    InvalidDenomination(u32),
    #[error("balance tolerance must be nonnegative, got {0}")]
    InvalidTolerance(Decimal),
    #[error("timeout must be positive")]
    InvalidTimeout,
    #[error("worker count must be at least 1")]
    InvalidWorkers,
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// General-path solving strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StrategyKind {
    /// Linear-programming relaxation over real-valued flows.
    Continuous,
    /// Integer flows in minor currency units with hard unidirectionality.
    #[default]
    Exact,
}

impl StrategyKind {
    /// Returns the canonical name of the strategy.
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Continuous => "continuous",
            StrategyKind::Exact => "exact",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(StrategyKind::Continuous),
            "exact" | "constrained" => Ok(StrategyKind::Exact),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for StrategyKind {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StrategyKind> for String {
    fn from(kind: StrategyKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Configuration of a [`crate::reconstruction::LinkReconstructor`].
///
/// # Examples
///
/// ```
/// use flow_reconstructor::config::{ReconstructorConfig, StrategyKind};
///
/// let config = ReconstructorConfig::from_json(r#"{ "strategy": "continuous" }"#).unwrap();
/// assert_eq!(config.strategy, StrategyKind::Continuous);
/// assert_eq!(config.denomination, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructorConfig {
    pub strategy: StrategyKind,
    /// Minor units per major currency unit, used by the exact strategy.
    pub denomination: u32,
    /// Per-transaction solve budget in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Largest accepted absolute sum of a transaction's split values.
    pub balance_tolerance: Decimal,
    /// Worker threads for batch reconstruction.
    pub workers: usize,
}

impl Default for ReconstructorConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Exact,
            denomination: 100,
            timeout_ms: None,
            balance_tolerance: dec!(0.005),
            workers: 1,
        }
    }
}

impl ReconstructorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Check every setting is within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.denomination == 0 {
            return Err(ConfigError::InvalidDenomination(self.denomination));
        }
        if self.balance_tolerance < Decimal::ZERO {
            return Err(ConfigError::InvalidTolerance(self.balance_tolerance));
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(())
    }

    /// Per-transaction solve budget, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconstructorConfig::default();
        assert_eq!(config.strategy, StrategyKind::Exact);
        assert_eq!(config.denomination, 100);
        assert!(config.timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!("continuous".parse::<StrategyKind>().unwrap(), StrategyKind::Continuous);
        assert_eq!("Constrained".parse::<StrategyKind>().unwrap(), StrategyKind::Exact);
        assert!(matches!(
            "simplex".parse::<StrategyKind>(),
            Err(ConfigError::UnknownStrategy(name)) if name == "simplex"
        ));
    }

    #[test]
    fn test_unknown_strategy_in_json_fails() {
        let err = ReconstructorConfig::from_json(r#"{ "strategy": "minizinc" }"#).unwrap_err();
        assert!(err.to_string().contains("minizinc"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ReconstructorConfig::from_json(r#"{ "denomination": 0 }"#),
            Err(ConfigError::InvalidDenomination(0))
        ));
        assert!(matches!(
            ReconstructorConfig::from_json(r#"{ "workers": 0 }"#),
            Err(ConfigError::InvalidWorkers)
        ));
        assert!(matches!(
            ReconstructorConfig::from_json(r#"{ "balance_tolerance": "-1" }"#),
            Err(ConfigError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn test_full_config() {
        let config = ReconstructorConfig::from_json(
            r#"{ "strategy": "exact", "denomination": 1000, "timeout_ms": 250, "workers": 4 }"#,
        )
        .unwrap();
        assert_eq!(config.denomination, 1000);
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn test_serializes_strategy_name() {
        let json = serde_json::to_string(&ReconstructorConfig::default()).unwrap();
        assert!(json.contains(r#""strategy":"exact""#));
    }
}

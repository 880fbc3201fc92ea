//! Settings for the decision binaries.
//!
//! Every field has a default, so running without a settings file is the
//! normal case. When `decision.toml` exists in the working directory it is
//! read and any section it sets overrides the defaults:
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [models]
//! match_model = "match_model.json"
//! pricing_model = "pricing_model.json"
//!
//! [match]
//! base_fare = 150.0
//! probability_markup = 100.0
//! order = "as_given"
//!
//! [[match.candidates]]
//! id = "DRV001"
//! name = "Arun"
//! rating = 4.5
//! eta_minutes = 8
//!
//! [pricing]
//! negative_price = "allow"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::candidates::{default_candidates, Candidate};
use crate::logging::LoggingConfig;
use crate::pricing::NegativePricePolicy;
use crate::ranking::{CandidateOrder, MatchPricing, BASE_FARE, PROBABILITY_MARKUP};

pub const SETTINGS_FILE: &str = "decision.toml";
pub const MATCH_MODEL_FILE: &str = "match_model.json";
pub const PRICING_MODEL_FILE: &str = "pricing_model.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub models: ModelPaths,
    #[serde(rename = "match")]
    pub matching: MatchSettings,
    pub pricing: PricingSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    pub match_model: PathBuf,
    pub pricing_model: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            match_model: PathBuf::from(MATCH_MODEL_FILE),
            pricing_model: PathBuf::from(PRICING_MODEL_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub base_fare: f64,
    pub probability_markup: f64,
    pub order: CandidateOrder,
    pub candidates: Vec<Candidate>,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            base_fare: BASE_FARE,
            probability_markup: PROBABILITY_MARKUP,
            order: CandidateOrder::default(),
            candidates: default_candidates(),
        }
    }
}

impl MatchSettings {
    pub fn pricing(&self) -> MatchPricing {
        MatchPricing {
            base_fare: self.base_fare,
            probability_markup: self.probability_markup,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    pub negative_price: NegativePricePolicy,
}

impl Settings {
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path` if it exists; otherwise return the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw, path),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::ReadFile {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// `decision.toml` in the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_default(SETTINGS_FILE)
    }
}

//! Stub models and fixtures shared by unit and integration tests.

use std::sync::Mutex;

use chrono::{DateTime, FixedOffset};

use crate::features::FeatureVector;
use crate::model::{Classifier, ModelError, Regressor};
use crate::temporal::{FixedClock, WallClock};

/// Classifier that always reports `positive` for class 1.
#[derive(Debug, Clone, Copy)]
pub struct ConstantClassifier {
    pub positive: f64,
}

impl ConstantClassifier {
    pub fn new(positive: f64) -> Self {
        Self { positive }
    }
}

impl Classifier for ConstantClassifier {
    fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        Ok(vec![1.0 - self.positive, self.positive])
    }
}

/// Regressor that always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstantRegressor {
    pub value: f64,
}

impl ConstantRegressor {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Regressor for ConstantRegressor {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(self.value)
    }
}

/// Regressor that remembers every feature vector it was asked about.
#[derive(Debug, Default)]
pub struct RecordingRegressor {
    pub value: f64,
    seen: Mutex<Vec<FeatureVector>>,
}

impl RecordingRegressor {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<FeatureVector> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

impl Regressor for RecordingRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(*features);
        }
        Ok(self.value)
    }
}

/// Wall-clock source pinned to an RFC 3339 instant.
///
/// # Panics
///
/// Panics if `rfc3339` does not parse.
pub fn pinned_wall_clock(rfc3339: &str) -> WallClock<FixedClock> {
    let at: DateTime<FixedOffset> =
        DateTime::parse_from_rfc3339(rfc3339).expect("pinned clock must be valid RFC 3339");
    WallClock::new(FixedClock(at))
}

//! Request → features → model → decision.
//!
//! Engines own a loaded model behind an `Arc` and never mutate it, so one
//! engine can serve any number of requests (or threads). Everything that
//! varies per call (clock, randomness, trip metrics) is passed in.

use std::sync::Arc;

use thiserror::Error;

use crate::candidates::{CandidateSource, StaticCandidatePool};
use crate::config::{MatchSettings, PricingSettings};
use crate::features::{EncodeError, FeatureEncoder, FeatureVector, RequestTrip, TripSource};
use crate::model::{Classifier, ModelError, Regressor};
use crate::pricing::{PriceError, PriceQuote, PriceResolver};
use crate::ranking::{MatchRanker, RankedCandidate};
use crate::request::TripRequest;
use crate::temporal::TemporalSource;
use crate::traffic::{SeededTraffic, TrafficEstimator};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("feature encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("model prediction failed: {0}")]
    Model(#[from] ModelError),
    #[error("price resolution failed: {0}")]
    Price(#[from] PriceError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub features: FeatureVector,
    pub match_probability: f64,
    pub candidates: Vec<RankedCandidate>,
}

pub struct MatchEngine {
    classifier: Arc<dyn Classifier>,
    candidates: Box<dyn CandidateSource>,
    ranker: MatchRanker,
}

impl MatchEngine {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        candidates: Box<dyn CandidateSource>,
        ranker: MatchRanker,
    ) -> Self {
        Self {
            classifier,
            candidates,
            ranker,
        }
    }

    pub fn from_settings(classifier: Arc<dyn Classifier>, settings: &MatchSettings) -> Self {
        Self::new(
            classifier,
            Box::new(StaticCandidatePool::new(settings.candidates.clone())),
            MatchRanker::new(settings.pricing(), settings.order),
        )
    }

    pub fn decide(
        &self,
        request: &TripRequest,
        trip: &mut dyn TripSource,
        temporal: &dyn TemporalSource,
        traffic: &mut dyn TrafficEstimator,
    ) -> Result<MatchDecision, EngineError> {
        let features = FeatureEncoder.encode(request, trip, temporal, traffic)?;
        let match_probability = self.classifier.positive_probability(&features)?;
        tracing::debug!(match_probability, "classifier output");

        let pool = self.candidates.fetch_candidates(request);
        let candidates = self.ranker.rank(match_probability, pool);
        Ok(MatchDecision {
            features,
            match_probability,
            candidates,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingDecision {
    pub features: FeatureVector,
    pub regression_output: f64,
    pub quote: PriceQuote,
}

pub struct PricingEngine {
    regressor: Arc<dyn Regressor>,
    resolver: PriceResolver,
}

impl PricingEngine {
    pub fn new(regressor: Arc<dyn Regressor>, resolver: PriceResolver) -> Self {
        Self {
            regressor,
            resolver,
        }
    }

    pub fn from_settings(regressor: Arc<dyn Regressor>, settings: &PricingSettings) -> Self {
        Self::new(regressor, PriceResolver::new(settings.negative_price))
    }

    /// Trip metrics come from the request and traffic is seeded from the
    /// trip, so the only varying input is `temporal`.
    pub fn quote(
        &self,
        request: &TripRequest,
        temporal: &dyn TemporalSource,
    ) -> Result<PricingDecision, EngineError> {
        let features =
            FeatureEncoder.encode(request, &mut RequestTrip, temporal, &mut SeededTraffic)?;
        let regression_output = self.regressor.predict(&features)?;
        tracing::debug!(regression_output, "regressor output");

        let quote = self.resolver.resolve(regression_output)?;
        Ok(PricingDecision {
            features,
            regression_output,
            quote,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{SampledTrip, AVAILABLE_SEATS, DISTANCE_KM};
    use crate::model::{LinearModel, LinearRegression};
    use crate::temporal::{EpochTime, FixedClock, WallClock};
    use crate::test_helpers::{pinned_wall_clock, ConstantClassifier, ConstantRegressor};
    use crate::traffic::RandomTraffic;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pinned_clock() -> WallClock<FixedClock> {
        pinned_wall_clock("2024-03-13T14:05:00+00:00")
    }

    #[test]
    fn match_engine_prices_every_candidate() {
        let engine = MatchEngine::from_settings(
            Arc::new(ConstantClassifier::new(0.8)),
            &MatchSettings::default(),
        );
        let decision = engine
            .decide(
                &TripRequest::default().with_seats(3),
                &mut SampledTrip::new(StdRng::seed_from_u64(1)),
                &EpochTime::new(Utc),
                &mut RandomTraffic::new(StdRng::seed_from_u64(2)),
            )
            .expect("decision");
        assert_eq!(decision.match_probability, 0.8);
        assert_eq!(decision.features.get(AVAILABLE_SEATS), Some(3.0));
        assert!(decision.candidates.iter().all(|c| c.price_suggested == 230));
    }

    #[test]
    fn match_engine_handles_empty_pool() {
        let engine = MatchEngine::new(
            Arc::new(ConstantClassifier::new(0.3)),
            Box::new(StaticCandidatePool::empty()),
            MatchRanker::default(),
        );
        let decision = engine
            .decide(
                &TripRequest::default(),
                &mut SampledTrip::new(StdRng::seed_from_u64(1)),
                &EpochTime::new(Utc),
                &mut RandomTraffic::new(StdRng::seed_from_u64(2)),
            )
            .expect("decision");
        assert!(decision.candidates.is_empty());
    }

    #[test]
    fn pricing_engine_is_reproducible_for_pinned_clock() {
        let regressor = LinearRegression(LinearModel {
            intercept: 50.0,
            coefficients: [6.0, 1.0, 0.0, 0.0, 0.5, 10.0],
        });
        let engine = PricingEngine::new(Arc::new(regressor), PriceResolver::default());
        let request = TripRequest::default()
            .with_distance_km(12.5)
            .with_duration_min(18.0);

        let first = engine.quote(&request, &pinned_clock()).expect("quote");
        let second = engine.quote(&request, &pinned_clock()).expect("quote");
        assert_eq!(first, second);
        assert_eq!(first.features.get(DISTANCE_KM), Some(12.5));
    }

    #[test]
    fn pricing_engine_surfaces_non_finite_output() {
        let engine = PricingEngine::new(
            Arc::new(ConstantRegressor::new(f64::NAN)),
            PriceResolver::default(),
        );
        let error = engine
            .quote(&TripRequest::default(), &pinned_clock())
            .expect_err("nan");
        assert!(matches!(error, EngineError::Price(PriceError::NonFinite(_))));
    }

    #[test]
    fn pricing_engine_surfaces_encoding_errors() {
        let engine = PricingEngine::new(
            Arc::new(ConstantRegressor::new(42.0)),
            PriceResolver::default(),
        );
        let error = engine
            .quote(&TripRequest::default().with_distance_km(-1.0), &pinned_clock())
            .expect_err("negative seed");
        assert!(matches!(error, EngineError::Encode(_)));
    }
}

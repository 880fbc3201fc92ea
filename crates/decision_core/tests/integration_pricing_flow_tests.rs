mod support;

use std::sync::Arc;

use decision_core::engine::PricingEngine;
use decision_core::features::{
    AVAILABLE_SEATS, DAY_OF_WEEK, DISTANCE_KM, DURATION_MIN, TIME_OF_DAY, TRAFFIC_LEVEL,
};
use decision_core::model::load_regressor;
use decision_core::pricing::{NegativePricePolicy, PriceResolver};
use decision_core::temporal::TemporalFeatures;
use decision_core::test_helpers::{pinned_wall_clock, ConstantRegressor, RecordingRegressor};
use decision_core::traffic::{SeededTraffic, TrafficEstimator, TrafficInputs};
use decision_core::TripRequest;

use support::{linear_fare_artifact, write_artifact};

// Wednesday 14:00.
const PINNED: &str = "2024-03-13T14:05:00+00:00";

#[test]
fn stub_fare_model_quotes_its_constant() {
    let engine = PricingEngine::new(
        Arc::new(ConstantRegressor::new(42.0)),
        PriceResolver::default(),
    );
    let request =
        TripRequest::from_json_str(r#"{"distance_km": 12.5, "duration_min": 18, "seats": 2}"#)
            .expect("request");

    let decision = engine.quote(&request, &pinned_wall_clock(PINNED)).expect("quote");
    let json = serde_json::to_string(&decision.quote).expect("serialize");
    assert_eq!(json, r#"{"price":42.0}"#);
}

#[test]
fn empty_request_encodes_defaults() {
    let regressor = Arc::new(RecordingRegressor::new(99.0));
    let engine = PricingEngine::new(regressor.clone(), PriceResolver::default());

    let request = TripRequest::from_json_str("{}").expect("request");
    engine
        .quote(&request, &pinned_wall_clock(PINNED))
        .expect("quote");

    let seen = regressor.seen();
    assert_eq!(seen.len(), 1);
    let features = seen[0];
    assert_eq!(features.get(DISTANCE_KM), Some(10.0));
    assert_eq!(features.get(DURATION_MIN), Some(20.0));
    assert_eq!(features.get(AVAILABLE_SEATS), Some(1.0));
    assert_eq!(features.get(DAY_OF_WEEK), Some(2.0));
    assert_eq!(features.get(TIME_OF_DAY), Some(14.0));
}

#[test]
fn traffic_feature_matches_seeded_estimator() {
    let regressor = Arc::new(RecordingRegressor::new(1.0));
    let engine = PricingEngine::new(regressor.clone(), PriceResolver::default());
    let request = TripRequest::default()
        .with_distance_km(12.5)
        .with_duration_min(18.0);

    engine.quote(&request, &pinned_wall_clock(PINNED)).expect("quote");

    let expected = SeededTraffic
        .estimate(&TrafficInputs {
            distance_km: 12.5,
            duration_min: 18.0,
            temporal: TemporalFeatures {
                day_of_week: 2,
                hour_of_day: 14,
            },
        })
        .expect("level");
    assert_eq!(
        regressor.seen()[0].get(TRAFFIC_LEVEL),
        Some(f64::from(expected.value()))
    );
}

#[test]
fn identical_trips_get_identical_quotes_at_the_same_hour() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_artifact(
        dir.path(),
        "pricing_model.json",
        &linear_fare_artifact(40.0, [9.0, 1.2, -2.0, 0.5, 0.75, 15.0]),
    );
    let regressor = load_regressor(&path).expect("model");
    let engine = PricingEngine::new(regressor, PriceResolver::default());
    let request = TripRequest::default()
        .with_distance_km(7.25)
        .with_duration_min(23.0)
        .with_seats(2);

    let quotes: Vec<f64> = (0..5)
        .map(|_| {
            engine
                .quote(&request, &pinned_wall_clock(PINNED))
                .expect("quote")
                .quote
                .price
        })
        .collect();
    assert!(quotes.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn negative_fares_follow_configured_policy() {
    let allow = PricingEngine::new(
        Arc::new(ConstantRegressor::new(-5.5)),
        PriceResolver::default(),
    );
    let clamp = PricingEngine::new(
        Arc::new(ConstantRegressor::new(-5.5)),
        PriceResolver::new(NegativePricePolicy::ClampToZero),
    );
    let request = TripRequest::default();
    let clock = pinned_wall_clock(PINNED);

    assert_eq!(allow.quote(&request, &clock).expect("quote").quote.price, -5.5);
    assert_eq!(clamp.quote(&request, &clock).expect("quote").quote.price, 0.0);
}

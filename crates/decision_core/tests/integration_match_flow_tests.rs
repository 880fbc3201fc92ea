mod support;

use std::sync::Arc;

use chrono::Utc;
use decision_core::candidates::{Candidate, StaticCandidatePool};
use decision_core::config::MatchSettings;
use decision_core::engine::MatchEngine;
use decision_core::features::{SampledTrip, AVAILABLE_SEATS, DAY_OF_WEEK, TIME_OF_DAY};
use decision_core::model::{load_classifier, ModelError};
use decision_core::ranking::{CandidateOrder, MatchPricing, MatchRanker};
use decision_core::temporal::EpochTime;
use decision_core::test_helpers::ConstantClassifier;
use decision_core::traffic::RandomTraffic;
use decision_core::TripRequest;
use rand::rngs::StdRng;
use rand::SeedableRng;

use support::{constant_match_forest, linear_fare_artifact, write_artifact};

fn decide(engine: &MatchEngine, request: &TripRequest) -> decision_core::MatchDecision {
    engine
        .decide(
            request,
            &mut SampledTrip::new(StdRng::seed_from_u64(11)),
            &EpochTime::new(Utc),
            &mut RandomTraffic::new(StdRng::seed_from_u64(12)),
        )
        .expect("decision")
}

#[test]
fn stub_classifier_prices_both_candidates_in_order() {
    let engine = MatchEngine::from_settings(
        Arc::new(ConstantClassifier::new(0.8)),
        &MatchSettings::default(),
    );
    let request =
        TripRequest::from_json_str(r#"{"seats": 3, "time_epoch": 1700000000}"#).expect("request");

    let decision = decide(&engine, &request);

    let json = serde_json::to_value(&decision.candidates).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!([
            {"id": "DRV001", "name": "Arun", "rating": 4.5, "eta_minutes": 8, "price_suggested": 230},
            {"id": "DRV002", "name": "Sneha", "rating": 4.7, "eta_minutes": 12, "price_suggested": 230}
        ])
    );
    assert_eq!(decision.features.get(AVAILABLE_SEATS), Some(3.0));
    assert_eq!(decision.features.get(DAY_OF_WEEK), Some(1.0));
    assert_eq!(decision.features.get(TIME_OF_DAY), Some(22.0));
}

#[test]
fn pinned_randomness_makes_match_features_reproducible() {
    let engine = MatchEngine::from_settings(
        Arc::new(ConstantClassifier::new(0.5)),
        &MatchSettings::default(),
    );
    let request = TripRequest::default().with_seats(2);

    let first = decide(&engine, &request);
    let second = decide(&engine, &request);
    assert_eq!(first.features, second.features);
}

#[test]
fn forest_artifact_drives_match_price() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_artifact(dir.path(), "match_model.json", &constant_match_forest(0.25));
    let classifier = load_classifier(&path).expect("model");
    let engine = MatchEngine::from_settings(classifier, &MatchSettings::default());

    let decision = decide(&engine, &TripRequest::default());
    assert!((decision.match_probability - 0.25).abs() < 1e-12);
    assert!(decision.candidates.iter().all(|c| c.price_suggested == 175));
}

#[test]
fn regression_artifact_cannot_serve_match_flow() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_artifact(
        dir.path(),
        "match_model.json",
        &linear_fare_artifact(0.0, [0.0; 6]),
    );
    let error = load_classifier(&path).expect_err("wrong task");
    assert!(matches!(error, ModelError::WrongTask { .. }));
}

#[test]
fn custom_pool_and_order_are_respected() {
    let pool = StaticCandidatePool::new(vec![
        Candidate::new("DRV010", "Kiran", 4.1, 15),
        Candidate::new("DRV011", "Divya", 4.8, 6),
        Candidate::new("DRV012", "Farah", 4.8, 9),
    ]);
    let engine = MatchEngine::new(
        Arc::new(ConstantClassifier::new(1.0)),
        Box::new(pool),
        MatchRanker::new(MatchPricing::default(), CandidateOrder::BestRating),
    );

    let decision = decide(&engine, &TripRequest::default());
    let names: Vec<_> = decision
        .candidates
        .iter()
        .map(|entry| entry.candidate.name.as_str())
        .collect();
    assert_eq!(names, vec!["Divya", "Farah", "Kiran"]);
    assert!(decision.candidates.iter().all(|c| c.price_suggested == 250));
}

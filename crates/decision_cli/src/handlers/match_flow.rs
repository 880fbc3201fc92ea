use anyhow::Context;
use decision_core::config::Settings;
use decision_core::engine::MatchEngine;
use decision_core::features::SampledTrip;
use decision_core::model::load_classifier;
use decision_core::temporal::EpochTime;
use decision_core::traffic::RandomTraffic;
use decision_core::TripRequest;

use crate::output::to_json_line;

/// Load the match model, rank candidates for `raw_request`, and return the
/// JSON line to print.
pub fn handle_match(raw_request: &str, settings: &Settings) -> anyhow::Result<String> {
    let model_path = &settings.models.match_model;
    let classifier = load_classifier(model_path)
        .with_context(|| format!("failed to load match model {}", model_path.display()))?;
    let engine = MatchEngine::from_settings(classifier, &settings.matching);

    let request = TripRequest::from_json_str(raw_request).context("invalid match request")?;
    tracing::debug!(?request, "match request");

    // Distance, duration and traffic are stand-ins until routing and
    // telemetry services exist.
    let decision = engine.decide(
        &request,
        &mut SampledTrip::new(rand::thread_rng()),
        &EpochTime::local(),
        &mut RandomTraffic::new(rand::thread_rng()),
    )?;

    to_json_line(&decision.candidates).context("failed to serialize match result")
}

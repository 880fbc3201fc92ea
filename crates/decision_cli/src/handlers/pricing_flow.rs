use anyhow::Context;
use decision_core::config::Settings;
use decision_core::engine::PricingEngine;
use decision_core::model::load_regressor;
use decision_core::temporal::WallClock;
use decision_core::TripRequest;

use crate::output::to_json_line;

/// Load the fare model, quote `raw_request` against the current local
/// time, and return the JSON line to print.
pub fn handle_pricing(raw_request: &str, settings: &Settings) -> anyhow::Result<String> {
    let model_path = &settings.models.pricing_model;
    let regressor = load_regressor(model_path)
        .with_context(|| format!("failed to load pricing model {}", model_path.display()))?;
    let engine = PricingEngine::from_settings(regressor, &settings.pricing);

    let request = TripRequest::from_json_str(raw_request).context("invalid pricing request")?;
    tracing::debug!(?request, "pricing request");

    let decision = engine.quote(&request, &WallClock::system())?;
    to_json_line(&decision.quote).context("failed to serialize price quote")
}

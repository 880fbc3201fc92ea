//! Decision engine for a ride-hailing marketplace.
//!
//! Two decisions share one pipeline:
//!
//! - **match**: predict the probability a rider/driver pairing succeeds,
//!   then price and order the candidate drivers ([`engine::MatchEngine`]).
//! - **pricing**: predict a fare from trip attributes ([`engine::PricingEngine`]).
//!
//! Both turn a loosely-typed [`request::TripRequest`] into a fixed-order
//! [`features::FeatureVector`], score it with a pre-trained model loaded by
//! [`model`], and turn the score into a decision.

pub mod candidates;
pub mod config;
pub mod engine;
pub mod features;
pub mod logging;
pub mod model;
pub mod pricing;
pub mod ranking;
pub mod request;
pub mod temporal;
pub mod traffic;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use engine::{EngineError, MatchDecision, MatchEngine, PricingDecision, PricingEngine};
pub use features::{FeatureVector, FEATURE_NAMES};
pub use request::TripRequest;

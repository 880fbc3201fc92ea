//! Fixed-order feature vector fed to the scoring models.
//!
//! Column order is part of the model contract: both models were trained
//! against exactly [`FEATURE_NAMES`]. Reordering silently corrupts
//! predictions, so the vector is only ever assembled here.

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::request::TripRequest;
use crate::temporal::{TemporalError, TemporalSource};
use crate::traffic::{TrafficError, TrafficEstimator, TrafficInputs};

pub const FEATURE_COUNT: usize = 6;

pub const DISTANCE_KM: usize = 0;
pub const DURATION_MIN: usize = 1;
pub const AVAILABLE_SEATS: usize = 2;
pub const DAY_OF_WEEK: usize = 3;
pub const TIME_OF_DAY: usize = 4;
pub const TRAFFIC_LEVEL: usize = 5;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "distance_km",
    "duration_min",
    "available_seats",
    "day_of_week",
    "time_of_day",
    "traffic_level",
];

#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    #[error(transparent)]
    Temporal(#[from] TemporalError),
    #[error(transparent)]
    Traffic(#[from] TrafficError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn names() -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_NAMES
    }
}

/// Distance and duration of the trip being decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripMetrics {
    pub distance_km: f64,
    pub duration_min: f64,
}

pub trait TripSource {
    fn trip_metrics(&mut self, request: &TripRequest) -> TripMetrics;
}

/// Reads distance and duration from the request, with defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestTrip;

impl TripSource for RequestTrip {
    fn trip_metrics(&mut self, request: &TripRequest) -> TripMetrics {
        TripMetrics {
            distance_km: request.distance_km(),
            duration_min: request.duration_min(),
        }
    }
}

/// Stand-in for a routing/ETA service: integer distance in `[5, 30)` km and
/// duration in `[10, 60)` minutes drawn from the injected generator.
#[derive(Debug)]
pub struct SampledTrip<R: Rng> {
    rng: R,
}

impl<R: Rng> SampledTrip<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> TripSource for SampledTrip<R> {
    fn trip_metrics(&mut self, _request: &TripRequest) -> TripMetrics {
        TripMetrics {
            distance_km: f64::from(self.rng.gen_range(5u32..30)),
            duration_min: f64::from(self.rng.gen_range(10u32..60)),
        }
    }
}

/// Assembles feature vectors from a request and its collaborators.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn encode(
        &self,
        request: &TripRequest,
        trip: &mut dyn TripSource,
        temporal: &dyn TemporalSource,
        traffic: &mut dyn TrafficEstimator,
    ) -> Result<FeatureVector, EncodeError> {
        let metrics = trip.trip_metrics(request);
        let calendar = temporal.temporal_features(request)?;
        let level = traffic.estimate(&TrafficInputs {
            distance_km: metrics.distance_km,
            duration_min: metrics.duration_min,
            temporal: calendar,
        })?;

        let mut values = [0.0; FEATURE_COUNT];
        values[DISTANCE_KM] = metrics.distance_km;
        values[DURATION_MIN] = metrics.duration_min;
        values[AVAILABLE_SEATS] = request.seats() as f64;
        values[DAY_OF_WEEK] = f64::from(calendar.day_of_week);
        values[TIME_OF_DAY] = f64::from(calendar.hour_of_day);
        values[TRAFFIC_LEVEL] = f64::from(level.value());

        let features = FeatureVector(values);
        tracing::debug!(features = ?features.as_slice(), "encoded feature vector");
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::EpochTime;
    use crate::traffic::SeededTraffic;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn encode_pricing(request: &TripRequest) -> FeatureVector {
        FeatureEncoder
            .encode(
                request,
                &mut RequestTrip,
                &EpochTime::new(Utc),
                &mut SeededTraffic,
            )
            .expect("encode")
    }

    #[test]
    fn empty_request_uses_defaults() {
        let features = encode_pricing(&TripRequest::default());
        assert_eq!(features.get(DISTANCE_KM), Some(10.0));
        assert_eq!(features.get(DURATION_MIN), Some(20.0));
        assert_eq!(features.get(AVAILABLE_SEATS), Some(1.0));
        assert_eq!(features.get(DAY_OF_WEEK), Some(2.0));
        assert_eq!(features.get(TIME_OF_DAY), Some(4.0));
        assert_eq!(features.as_slice().len(), FEATURE_COUNT);
    }

    #[test]
    fn seats_only_touch_index_two() {
        let base = TripRequest::default().with_distance_km(12.5).with_duration_min(18.0);
        let one = encode_pricing(&base.clone().with_seats(1));
        let four = encode_pricing(&base.with_seats(4));

        for index in 0..FEATURE_COUNT {
            if index == AVAILABLE_SEATS {
                assert_ne!(one.get(index), four.get(index));
            } else {
                assert_eq!(one.get(index), four.get(index), "index {index} changed");
            }
        }
    }

    #[test]
    fn sampled_trip_stays_in_stand_in_ranges() {
        let mut source = SampledTrip::new(StdRng::seed_from_u64(3));
        for _ in 0..100 {
            let metrics = source.trip_metrics(&TripRequest::default());
            assert!((5.0..30.0).contains(&metrics.distance_km));
            assert!((10.0..60.0).contains(&metrics.duration_min));
            assert_eq!(metrics.distance_km.fract(), 0.0);
        }
    }

    #[test]
    fn feature_vector_serializes_as_plain_array() {
        let features = FeatureVector::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 2.0]);
        let json = serde_json::to_string(&features).expect("serialize");
        assert_eq!(json, "[1.0,2.0,3.0,4.0,5.0,2.0]");
    }

    #[test]
    fn names_follow_column_constants() {
        let names = FeatureVector::names();
        assert_eq!(names[AVAILABLE_SEATS], "available_seats");
        assert_eq!(names[TRAFFIC_LEVEL], "traffic_level");
    }

    #[test]
    fn traffic_errors_propagate() {
        let request = TripRequest::default().with_distance_km(-5.0);
        let result = FeatureEncoder.encode(
            &request,
            &mut RequestTrip,
            &EpochTime::new(Utc),
            &mut SeededTraffic,
        );
        assert!(matches!(result, Err(EncodeError::Traffic(_))));
    }
}

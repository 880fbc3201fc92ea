//! Day-of-week and hour-of-day features.
//!
//! The match flow reads the request's `time_epoch`; the pricing flow reads
//! the current local time. Both go through [`TemporalSource`] so the time
//! zone and the clock can be pinned in tests.

use chrono::{DateTime, Datelike, FixedOffset, Local, TimeZone, Timelike};
use thiserror::Error;

use crate::request::TripRequest;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("epoch {0} is outside the representable date range")]
    EpochOutOfRange(i64),
}

/// Calendar features derived from a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalFeatures {
    /// 0 = Monday, 6 = Sunday.
    pub day_of_week: u32,
    /// 0-23, in the time zone the instant was interpreted in.
    pub hour_of_day: u32,
}

pub fn decompose_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> TemporalFeatures {
    TemporalFeatures {
        day_of_week: at.weekday().num_days_from_monday(),
        hour_of_day: at.hour(),
    }
}

/// Interpret `epoch_seconds` in `tz` and decompose it.
pub fn decompose_epoch<Tz: TimeZone>(
    epoch_seconds: i64,
    tz: &Tz,
) -> Result<TemporalFeatures, TemporalError> {
    let at = tz
        .timestamp_opt(epoch_seconds, 0)
        .single()
        .ok_or(TemporalError::EpochOutOfRange(epoch_seconds))?;
    Ok(decompose_datetime(&at))
}

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Process local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Produces temporal features for a request.
pub trait TemporalSource {
    fn temporal_features(&self, request: &TripRequest) -> Result<TemporalFeatures, TemporalError>;
}

/// Reads `time_epoch` from the request (or its default) and interprets it in `tz`.
#[derive(Debug, Clone)]
pub struct EpochTime<Tz: TimeZone> {
    tz: Tz,
}

impl<Tz: TimeZone> EpochTime<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl EpochTime<Local> {
    pub fn local() -> Self {
        Self::new(Local)
    }
}

impl<Tz: TimeZone> TemporalSource for EpochTime<Tz> {
    fn temporal_features(&self, request: &TripRequest) -> Result<TemporalFeatures, TemporalError> {
        decompose_epoch(request.time_epoch(), &self.tz)
    }
}

/// Ignores the request and reads the clock. Two identical requests made at
/// different times yield different features.
#[derive(Debug, Clone)]
pub struct WallClock<C: Clock> {
    clock: C,
}

impl<C: Clock> WallClock<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl WallClock<SystemClock> {
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> TemporalSource for WallClock<C> {
    fn temporal_features(&self, _request: &TripRequest) -> Result<TemporalFeatures, TemporalError> {
        Ok(decompose_datetime(&self.clock.now()))
    }
}

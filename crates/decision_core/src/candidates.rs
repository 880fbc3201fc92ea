use serde::{Deserialize, Serialize};

use crate::request::TripRequest;

/// A driver eligible for matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub rating: f64,
    pub eta_minutes: u32,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rating: f64,
        eta_minutes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rating,
            eta_minutes,
        }
    }
}

/// Supplies the drivers a match decision is made over.
pub trait CandidateSource: Send + Sync {
    fn fetch_candidates(&self, request: &TripRequest) -> Vec<Candidate>;
}

/// A fixed list of drivers, returned as-is for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCandidatePool {
    candidates: Vec<Candidate>,
}

impl StaticCandidatePool {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Default for StaticCandidatePool {
    fn default() -> Self {
        Self::new(default_candidates())
    }
}

impl CandidateSource for StaticCandidatePool {
    fn fetch_candidates(&self, _request: &TripRequest) -> Vec<Candidate> {
        self.candidates.clone()
    }
}

/// The two demo drivers used until an inventory service exists.
pub fn default_candidates() -> Vec<Candidate> {
    vec![
        Candidate::new("DRV001", "Arun", 4.5, 8),
        Candidate::new("DRV002", "Sneha", 4.7, 12),
    ]
}

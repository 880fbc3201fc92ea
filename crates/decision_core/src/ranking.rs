//! Match ranking: attach a suggested price to each candidate and order them.
//!
//! Price is a linear markup on predicted match quality:
//! `round(base_fare + probability * probability_markup)`, rounding halves to
//! even. With the defaults a certain match costs 250 and a hopeless one 150.

use serde::{Deserialize, Serialize};

use crate::candidates::Candidate;

/// Default base fare in currency units.
pub const BASE_FARE: f64 = 150.0;

/// Default markup added at match probability 1.0.
pub const PROBABILITY_MARKUP: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPricing {
    pub base_fare: f64,
    pub probability_markup: f64,
}

impl Default for MatchPricing {
    fn default() -> Self {
        Self {
            base_fare: BASE_FARE,
            probability_markup: PROBABILITY_MARKUP,
        }
    }
}

impl MatchPricing {
    pub fn suggested_price(&self, match_probability: f64) -> i64 {
        (self.base_fare + match_probability * self.probability_markup).round_ties_even() as i64
    }
}

/// How ranked candidates are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrder {
    /// Keep the order the candidate source returned.
    #[default]
    AsGiven,
    /// Highest rating first; ties keep source order.
    BestRating,
    /// Shortest ETA first; ties keep source order.
    ShortestEta,
}

/// A candidate annotated with its suggested price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub price_suggested: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchRanker {
    pub pricing: MatchPricing,
    pub order: CandidateOrder,
}

impl MatchRanker {
    pub fn new(pricing: MatchPricing, order: CandidateOrder) -> Self {
        Self { pricing, order }
    }

    pub fn rank(&self, match_probability: f64, candidates: Vec<Candidate>) -> Vec<RankedCandidate> {
        let price_suggested = self.pricing.suggested_price(match_probability);
        let mut ranked: Vec<_> = candidates
            .into_iter()
            .map(|candidate| RankedCandidate {
                candidate,
                price_suggested,
            })
            .collect();

        match self.order {
            CandidateOrder::AsGiven => {}
            CandidateOrder::BestRating => ranked
                .sort_by(|a, b| b.candidate.rating.total_cmp(&a.candidate.rating)),
            CandidateOrder::ShortestEta => ranked.sort_by_key(|entry| entry.candidate.eta_minutes),
        }

        tracing::info!(
            match_probability,
            price_suggested,
            candidates = ranked.len(),
            "ranked match candidates"
        );
        ranked
    }
}

//! Candidate ranking for a shift defined by profession and offered hourly wage.
//!
//! Scoring is pure: callers hand in a candidate list that has already been narrowed to the
//! requested profession and to available workers, and receive the same candidates back
//! with their subscores, ordered best first. Rates and wages are unsigned, so the only
//! precondition left to callers is that the list really is pre-filtered.

mod config;
pub mod tiers;

pub use config::{MatchTier, MatchingConfig};

use serde::{Deserialize, Serialize};

use super::domain::WorkerId;

/// A worker as seen by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub worker_id: WorkerId,
    pub profession: String,
    pub hourly_rate: u32,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_reviews: u32,
}

/// Candidate annotated with its subscores. `match_score` is always the sum of the three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub wage_fit: u8,
    pub rating_score: u8,
    pub experience_score: u8,
    pub match_score: u16,
}

/// Score a single candidate against the offered wage (`0` means no preference).
pub fn score_candidate(offered_wage: u32, candidate: Candidate) -> ScoredCandidate {
    let wage_fit = tiers::wage_fit(offered_wage, candidate.hourly_rate);
    let rating_score = tiers::rating_score(candidate.average_rating);
    let experience_score = tiers::experience_score(candidate.total_reviews);
    let match_score = u16::from(wage_fit) + u16::from(rating_score) + u16::from(experience_score);

    ScoredCandidate {
        candidate,
        wage_fit,
        rating_score,
        experience_score,
        match_score,
    }
}

/// Score and rank candidates: highest `match_score` first, cheaper rate first on ties,
/// input order otherwise. No candidate is dropped.
pub fn score_candidates(offered_wage: u32, candidates: Vec<Candidate>) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| score_candidate(offered_wage, candidate))
        .collect();

    // `sort_by` is stable, which keeps input order for full ties.
    scored.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| a.candidate.hourly_rate.cmp(&b.candidate.hourly_rate))
    });

    scored
}

/// Ranked candidate carrying its presentation tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub scored: ScoredCandidate,
    pub tier: MatchTier,
}

/// Stateless ranker that applies the matching configuration on top of the scorer.
#[derive(Debug, Clone, Default)]
pub struct MatchScorer {
    config: MatchingConfig,
}

impl MatchScorer {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn rank(&self, offered_wage: u32, candidates: Vec<Candidate>) -> Vec<RankedCandidate> {
        score_candidates(offered_wage, candidates)
            .into_iter()
            .map(|scored| RankedCandidate {
                tier: self.config.tier_for(scored.match_score),
                scored,
            })
            .collect()
    }
}

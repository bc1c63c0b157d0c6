use serde::{Deserialize, Serialize};

/// Dials applied around the scorer: how many candidates to fetch and where "top" starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub candidate_limit: usize,
    pub top_match_threshold: u16,
}

impl MatchingConfig {
    pub fn tier_for(&self, match_score: u16) -> MatchTier {
        if match_score >= self.top_match_threshold {
            MatchTier::TopMatch
        } else {
            MatchTier::GoodMatch
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 50,
            top_match_threshold: 150,
        }
    }
}

/// Presentation label attached to a ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    TopMatch,
    GoodMatch,
}

impl MatchTier {
    pub const fn label(self) -> &'static str {
        match self {
            MatchTier::TopMatch => "top match",
            MatchTier::GoodMatch => "good match",
        }
    }
}

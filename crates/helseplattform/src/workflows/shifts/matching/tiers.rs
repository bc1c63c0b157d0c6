//! Tier tables backing the three match subscores.
//!
//! Each table is an ordered list of `(threshold, score)` pairs. Lookups walk the table
//! top-down and take the first row whose threshold matches, falling back to the floor
//! score when none does.

/// Wage-fit awarded when the requester expressed no wage preference.
pub const NEUTRAL_WAGE_FIT: u8 = 40;

/// Wage-fit awarded when the worker's rate is at or below the offered wage.
pub const ACCEPTED_WAGE_FIT: u8 = 100;

/// `(maximum percentage above the offered wage, wage-fit)`. Upper bounds are inclusive,
/// so a rate exactly 10% above the offer still lands in the 90 tier.
pub const WAGE_OVERAGE_TIERS: [(u32, u8); 9] = [
    (10, 90),
    (20, 80),
    (30, 70),
    (40, 60),
    (50, 50),
    (60, 40),
    (70, 30),
    (80, 20),
    (90, 10),
];

/// `(minimum average rating, rating subscore)`, lower bounds inclusive.
pub const RATING_TIERS: [(f64, u8); 5] = [(4.5, 50), (4.0, 40), (3.5, 30), (3.0, 20), (2.5, 10)];

/// `(minimum review count, experience subscore)`, lower bounds inclusive.
pub const EXPERIENCE_TIERS: [(u32, u8); 4] = [(20, 20), (10, 15), (5, 10), (1, 5)];

pub const MAX_WAGE_FIT: u8 = ACCEPTED_WAGE_FIT;
pub const MAX_RATING_SCORE: u8 = RATING_TIERS[0].1;
pub const MAX_EXPERIENCE_SCORE: u8 = EXPERIENCE_TIERS[0].1;

/// Upper bound of the composite match score.
pub const MAX_MATCH_SCORE: u16 =
    MAX_WAGE_FIT as u16 + MAX_RATING_SCORE as u16 + MAX_EXPERIENCE_SCORE as u16;

/// Wage-fit subscore in `0..=100`.
///
/// The overage comparison `(rate - offered) / offered * 100 <= threshold` is evaluated as
/// `(rate - offered) * 100 <= threshold * offered` in integers so boundary rates never
/// slip a tier through rounding.
pub fn wage_fit(offered_wage: u32, hourly_rate: u32) -> u8 {
    if offered_wage == 0 {
        return NEUTRAL_WAGE_FIT;
    }
    if hourly_rate <= offered_wage {
        return ACCEPTED_WAGE_FIT;
    }

    let overage = u64::from(hourly_rate - offered_wage) * 100;
    let offered = u64::from(offered_wage);

    WAGE_OVERAGE_TIERS
        .iter()
        .find(|(max_percent, _)| overage <= u64::from(*max_percent) * offered)
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

/// Rating subscore in `0..=50`. A missing rating scores like a zero rating.
pub fn rating_score(average_rating: Option<f64>) -> u8 {
    let rating = average_rating.unwrap_or(0.0);
    RATING_TIERS
        .iter()
        .find(|(min_rating, _)| rating >= *min_rating)
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

/// Experience subscore in `0..=20`, driven by the number of reviews received.
pub fn experience_score(total_reviews: u32) -> u8 {
    EXPERIENCE_TIERS
        .iter()
        .find(|(min_reviews, _)| total_reviews >= *min_reviews)
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

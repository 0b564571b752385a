//! Investment value and loyalty tier math.
//!
//! Pure functions only: a position's current value is always recomputed
//! from the principal, the rate locked at creation, and the elapsed time,
//! never read back from a stored figure that could drift.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::TierThresholds;
use crate::models::user::Tier;

const SECONDS_PER_DAY: i64 = 86_400;
const DAYS_PER_YEAR: f64 = 365.0;

/// Raw calculator output. Currency rounding happens only at the wire
/// form (`ValueSnapshot`), never here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueBreakdown {
    pub current_value: f64,
    pub profit: f64,
    pub days_since_start: i64,
}

impl ValueBreakdown {
    pub fn snapshot(&self) -> ValueSnapshot {
        ValueSnapshot {
            current_value: format!("{:.2}", self.current_value),
            profit: format!("{:.2}", self.profit),
            days_since_start: self.days_since_start,
        }
    }
}

/// Currency-formatted shape returned to the HTTP layer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValueSnapshot {
    pub current_value: String,
    pub profit: String,
    pub days_since_start: i64,
}

/// Simple interest on the principal: `amount * (rate / 100 / 365) * days`,
/// with a fixed 365-day year and no compounding.
///
/// Elapsed days are floored, so partial days earn nothing. A future
/// `start` (clock skew, bad input) legitimately yields negative profit;
/// callers treat that as a diagnostic signal rather than clamping it.
pub fn calculate_current_value(
    principal: f64,
    annual_rate_percent: f64,
    start: DateTime<Utc>,
    as_of: DateTime<Utc>,
) -> ValueBreakdown {
    let days_since_start = (as_of - start).num_seconds().div_euclid(SECONDS_PER_DAY);
    let daily_rate = annual_rate_percent / 100.0 / DAYS_PER_YEAR;
    let profit = principal * daily_rate * days_since_start as f64;

    ValueBreakdown {
        current_value: principal + profit,
        profit,
        days_since_start,
    }
}

/// Classify cumulative invested principal into a loyalty tier.
/// Boundaries are inclusive and evaluated from platinum down.
pub fn classify_tier(total_invested: f64, thresholds: &TierThresholds) -> Tier {
    if total_invested >= thresholds.platinum_min {
        Tier::Platinum
    } else if total_invested >= thresholds.gold_min {
        Tier::Gold
    } else if total_invested >= thresholds.silver_min {
        Tier::Silver
    } else {
        Tier::Bronze
    }
}

/// The next threshold above `current`, if any, for progress display.
pub fn next_tier_target(current: Tier, thresholds: &TierThresholds) -> Option<(Tier, f64)> {
    match current {
        Tier::Bronze => Some((Tier::Silver, thresholds.silver_min)),
        Tier::Silver => Some((Tier::Gold, thresholds.gold_min)),
        Tier::Gold => Some((Tier::Platinum, thresholds.platinum_min)),
        Tier::Platinum => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn default_thresholds() -> TierThresholds {
        TierThresholds {
            silver_min: 1000.0,
            gold_min: 5000.0,
            platinum_min: 20000.0,
        }
    }

    #[test]
    fn zero_elapsed_days_earn_nothing() {
        let now = Utc::now();
        let breakdown = calculate_current_value(1000.0, 12.0, now, now);

        assert_eq!(breakdown.days_since_start, 0);
        let snapshot = breakdown.snapshot();
        assert_eq!(snapshot.profit, "0.00");
        assert_eq!(snapshot.current_value, "1000.00");
    }

    #[test]
    fn partial_days_are_floored() {
        let as_of = Utc::now();
        let start = as_of - Duration::hours(47);
        let breakdown = calculate_current_value(1000.0, 12.0, start, as_of);
        assert_eq!(breakdown.days_since_start, 1);
    }

    #[test]
    fn one_year_at_36_5_percent_is_exact() {
        // 36.5 / 100 / 365 = 0.001 per day, so a year earns 36.5%.
        let as_of = Utc::now();
        let start = as_of - Duration::days(365);
        let snapshot = calculate_current_value(1000.0, 36.5, start, as_of).snapshot();

        assert_eq!(snapshot.days_since_start, 365);
        assert_eq!(snapshot.profit, "365.00");
        assert_eq!(snapshot.current_value, "1365.00");
    }

    #[test]
    fn calculator_is_pure() {
        let as_of = Utc::now();
        let start = as_of - Duration::days(90);
        let first = calculate_current_value(2500.0, 8.25, start, as_of);
        let second = calculate_current_value(2500.0, 8.25, start, as_of);
        assert_eq!(first, second);
    }

    #[test]
    fn future_start_yields_negative_profit() {
        let as_of = Utc::now();
        let start = as_of + Duration::days(10);
        let breakdown = calculate_current_value(1000.0, 36.5, start, as_of);

        assert_eq!(breakdown.days_since_start, -10);
        assert!(breakdown.profit < 0.0);
        assert!(breakdown.current_value < 1000.0);
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        let thresholds = default_thresholds();
        assert_eq!(classify_tier(0.0, &thresholds), Tier::Bronze);
        assert_eq!(classify_tier(999.0, &thresholds), Tier::Bronze);
        assert_eq!(classify_tier(1000.0, &thresholds), Tier::Silver);
        assert_eq!(classify_tier(4999.0, &thresholds), Tier::Silver);
        assert_eq!(classify_tier(5000.0, &thresholds), Tier::Gold);
        assert_eq!(classify_tier(19999.0, &thresholds), Tier::Gold);
        assert_eq!(classify_tier(20000.0, &thresholds), Tier::Platinum);
        assert_eq!(classify_tier(1_000_000.0, &thresholds), Tier::Platinum);
    }

    #[test]
    fn next_tier_walks_up_and_tops_out() {
        let thresholds = default_thresholds();
        assert_eq!(
            next_tier_target(Tier::Bronze, &thresholds),
            Some((Tier::Silver, 1000.0))
        );
        assert_eq!(
            next_tier_target(Tier::Gold, &thresholds),
            Some((Tier::Platinum, 20000.0))
        );
        assert_eq!(next_tier_target(Tier::Platinum, &thresholds), None);
    }

    #[test]
    fn snapshot_rounds_to_two_decimals() {
        let as_of = Utc::now();
        let start = as_of - Duration::days(33);
        // 7500 * (11.4 / 100 / 365) * 33 = 77.301369...
        let snapshot = calculate_current_value(7500.0, 11.4, start, as_of).snapshot();
        assert_eq!(snapshot.profit, "77.30");
        assert_eq!(snapshot.current_value, "7577.30");
    }
}

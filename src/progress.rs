//! Set completion counters.
//!
//! Owned card ids are mapped to catalog card numbers and counted against
//! fixed number ranges of the set.

use std::collections::HashSet;

use crate::models::Card;

pub const STANDARD_LAST: u32 = 198;
pub const FULL_LAST: u32 = 258;
/// Every card of the full range in both regular and reverse-holo printings.
pub const COMPLETE_TOTAL: u32 = 516;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub owned: usize,
    pub total: u32,
}

impl Completion {
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.owned as f32 / self.total as f32) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressReport {
    pub standard: Completion,
    pub full: Completion,
    /// Approximation: reverse holos are not tracked apart from regular
    /// copies yet, so this reuses the full-range count over the doubled total.
    pub complete: Completion,
}

impl ProgressReport {
    pub fn compute(owned_ids: &[i64], catalog: &[Card]) -> Self {
        let owned_ids: HashSet<i64> = owned_ids.iter().copied().collect();
        let numbers: Vec<u32> = catalog
            .iter()
            .filter(|card| owned_ids.contains(&card.id))
            .filter_map(|card| card_number(&card.card_number))
            .collect();

        let in_range = |last: u32| numbers.iter().filter(|&&n| n >= 1 && n <= last).count();
        let standard = in_range(STANDARD_LAST);
        let full = in_range(FULL_LAST);

        Self {
            standard: Completion {
                owned: standard,
                total: STANDARD_LAST,
            },
            full: Completion {
                owned: full,
                total: FULL_LAST,
            },
            complete: Completion {
                owned: full,
                total: COMPLETE_TOTAL,
            },
        }
    }
}

/// Leading decimal digits of a card number: "025" is 25, "12a" is 12, and
/// "TG01" has no number.
pub fn card_number(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

//! Average cycle length and the per-length reports built on top of it.

use std::collections::BTreeMap;

use crate::models::{CycleLengthEntry, LengthCount, Period};

/// Mean of `lengths` rounded half-up, or `None` when nothing is known yet.
pub fn average_length(lengths: &[i32]) -> Option<i32> {
    if lengths.is_empty() {
        return None;
    }
    let sum: i64 = lengths.iter().map(|&l| i64::from(l)).sum();
    let count = lengths.len() as i64;
    // Lengths are non-negative, so (2s + n) / 2n is round-half-up of s / n.
    Some(((2 * sum + count) / (2 * count)) as i32)
}

/// New average for a user whose current average is `current`.
pub fn recompute_average(current: i32, lengths: &[i32]) -> i32 {
    average_length(lengths).unwrap_or(current)
}

/// How many cycles had each known length, shortest first.
pub fn length_frequency(periods: &[Period]) -> Vec<LengthCount> {
    let mut counts = BTreeMap::<i32, usize>::new();
    for length in periods.iter().filter_map(|p| p.length) {
        *counts.entry(length).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(length, count)| LengthCount { length, count })
        .collect()
}

/// Known lengths in start-date order.
pub fn length_history(periods: &[Period]) -> Vec<CycleLengthEntry> {
    let mut history: Vec<CycleLengthEntry> = periods
        .iter()
        .filter_map(|p| {
            p.length.map(|length| CycleLengthEntry {
                start_date: p.start_date,
                length,
            })
        })
        .collect();
    history.sort_by_key(|entry| entry.start_date);
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn period(y: i32, m: u32, d: u32, length: Option<i32>) -> Period {
        Period {
            length,
            ..Period::new(Uuid::nil(), NaiveDate::from_ymd_opt(y, m, d).unwrap())
        }
    }

    #[test]
    fn average_rounds_half_up() {
        assert_eq!(average_length(&[28, 29]), Some(29));
        assert_eq!(average_length(&[27, 28]), Some(28));
        assert_eq!(average_length(&[28, 28, 29]), Some(28));
        assert_eq!(average_length(&[28, 29, 29]), Some(29));
        assert_eq!(average_length(&[57]), Some(57));
    }

    #[test]
    fn unknown_lengths_keep_current_average() {
        assert_eq!(average_length(&[]), None);
        assert_eq!(recompute_average(28, &[]), 28);
        assert_eq!(recompute_average(31, &[]), 31);
        assert_eq!(recompute_average(28, &[30, 32]), 31);
    }

    #[test]
    fn frequency_counts_known_lengths_only() {
        let periods = vec![
            period(2024, 1, 1, Some(28)),
            period(2024, 1, 29, Some(29)),
            period(2024, 2, 27, Some(28)),
            period(2024, 3, 26, None),
        ];
        assert_eq!(
            length_frequency(&periods),
            vec![
                LengthCount { length: 28, count: 2 },
                LengthCount { length: 29, count: 1 },
            ]
        );
    }

    #[test]
    fn history_is_ordered_by_start_date() {
        let periods = vec![
            period(2024, 1, 29, Some(29)),
            period(2024, 2, 27, None),
            period(2024, 1, 1, Some(28)),
        ];
        let history = length_history(&periods);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].length, 28);
        assert_eq!(history[1].length, 29);
    }
}

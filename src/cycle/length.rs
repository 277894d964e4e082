//! Cycle length derivation.
//!
//! A period's `length` is the number of days until the same user's next
//! period. Inserting or removing a period only moves the boundary of the
//! period right before it, so one level of neighbour repair is enough.

use chrono::NaiveDate;

use crate::models::Period;

/// Whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i32 {
    // NaiveDate spans fewer than i32::MAX days, so this never truncates.
    (to - from).num_days() as i32
}

/// Changes implied by inserting a period at a given date.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertFix {
    /// The preceding period with its length pointing at the new date.
    pub previous: Option<Period>,
    /// Length of the inserted period itself.
    pub own_length: Option<i32>,
}

/// Neighbour repair for a period inserted at `start_date`.
pub fn on_insert(
    previous: Option<Period>,
    start_date: NaiveDate,
    next: Option<&Period>,
) -> InsertFix {
    let previous = previous.map(|mut prev| {
        prev.length = Some(days_between(prev.start_date, start_date));
        prev
    });
    let own_length = next.map(|next| days_between(start_date, next.start_date));
    InsertFix {
        previous,
        own_length,
    }
}

/// Neighbour repair for a removed period: the previous period either bridges
/// the gap to the next one or becomes the most recent. Returns the period to
/// write back, if any.
pub fn on_delete(previous: Option<Period>, next: Option<&Period>) -> Option<Period> {
    let mut prev = previous?;
    prev.length = next.map(|next| days_between(prev.start_date, next.start_date));
    Some(prev)
}

/// Lengths for a full, ascending sequence of start dates.
pub fn expected_lengths(dates: &[NaiveDate]) -> Vec<Option<i32>> {
    let mut lengths: Vec<Option<i32>> = dates
        .windows(2)
        .map(|pair| Some(days_between(pair[0], pair[1])))
        .collect();
    if !dates.is_empty() {
        lengths.push(None);
    }
    lengths
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(start: NaiveDate, length: Option<i32>) -> Period {
        Period {
            length,
            ..Period::new(Uuid::nil(), start)
        }
    }

    #[test]
    fn days_between_spans_month_and_leap_day() {
        assert_eq!(days_between(date(2024, 1, 1), date(2024, 1, 29)), 28);
        assert_eq!(days_between(date(2024, 2, 1), date(2024, 3, 1)), 29);
        assert_eq!(days_between(date(2023, 12, 20), date(2024, 1, 17)), 28);
    }

    #[test]
    fn insert_after_latest_sets_previous_and_leaves_own_open() {
        let prev = period(date(2024, 1, 1), None);
        let fix = on_insert(Some(prev), date(2024, 1, 29), None);
        assert_eq!(fix.previous.unwrap().length, Some(28));
        assert_eq!(fix.own_length, None);
    }

    #[test]
    fn insert_between_splits_the_gap() {
        let prev = period(date(2024, 1, 1), Some(57));
        let next = period(date(2024, 2, 27), None);
        let fix = on_insert(Some(prev), date(2024, 1, 29), Some(&next));
        assert_eq!(fix.previous.unwrap().length, Some(28));
        assert_eq!(fix.own_length, Some(29));
    }

    #[test]
    fn insert_before_earliest_touches_nothing_else() {
        let next = period(date(2024, 1, 29), None);
        let fix = on_insert(None, date(2024, 1, 1), Some(&next));
        assert!(fix.previous.is_none());
        assert_eq!(fix.own_length, Some(28));
    }

    #[test]
    fn delete_middle_bridges_neighbours() {
        let prev = period(date(2024, 1, 1), Some(28));
        let next = period(date(2024, 2, 27), None);
        let fixed = on_delete(Some(prev), Some(&next)).unwrap();
        assert_eq!(fixed.length, Some(57));
    }

    #[test]
    fn delete_latest_reopens_previous() {
        let prev = period(date(2024, 1, 1), Some(28));
        let fixed = on_delete(Some(prev), None).unwrap();
        assert_eq!(fixed.length, None);
    }

    #[test]
    fn delete_earliest_or_only_is_a_no_op() {
        let next = period(date(2024, 2, 27), None);
        assert!(on_delete(None, Some(&next)).is_none());
        assert!(on_delete(None, None).is_none());
    }

    #[test]
    fn expected_lengths_leave_last_open() {
        let dates = [date(2024, 1, 1), date(2024, 1, 29), date(2024, 2, 27)];
        assert_eq!(expected_lengths(&dates), vec![Some(28), Some(29), None]);
        assert_eq!(expected_lengths(&dates[..1]), vec![None]);
        assert!(expected_lengths(&[]).is_empty());
    }
}

//! Forward projection of periods and ovulations from the latest period.

use chrono::{Duration, NaiveDate};

use crate::error::{AppError, Result};

/// Number of upcoming cycles projected.
pub const PROJECTED_CYCLES: i32 = 3;

/// Wire value for [`current_cycle_length`] when no period is recorded.
pub const UNKNOWN_CYCLE_LENGTH: i64 = -1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub next_periods: Vec<NaiveDate>,
    pub next_ovulations: Vec<NaiveDate>,
}

impl Projection {
    /// Projects from the latest period start; both sequences are empty when
    /// there is none.
    pub fn from_latest(
        last_start: Option<NaiveDate>,
        average_cycle_length: i32,
        luteal_phase_length: i32,
    ) -> Result<Self> {
        let Some(last_start) = last_start else {
            return Ok(Self::default());
        };
        Ok(Self {
            next_periods: project(last_start, average_cycle_length, 0)?,
            next_ovulations: project(last_start, average_cycle_length, luteal_phase_length)?,
        })
    }
}

fn project(last_start: NaiveDate, cycle_length: i32, offset: i32) -> Result<Vec<NaiveDate>> {
    (1..=i64::from(PROJECTED_CYCLES))
        .map(|i| {
            let days = i * i64::from(cycle_length) - i64::from(offset);
            Duration::try_days(days)
                .and_then(|delta| last_start.checked_add_signed(delta))
                .ok_or(AppError::ProjectionOutOfRange(last_start))
        })
        .collect()
}

/// Days since the latest period started.
pub fn current_cycle_length(last_start: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    last_start.map(|start| (today - start).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn projects_three_cycles_ahead() {
        let projection = Projection::from_latest(Some(date(2024, 2, 27)), 29, 14).unwrap();
        assert_eq!(
            projection.next_periods,
            vec![date(2024, 3, 27), date(2024, 4, 25), date(2024, 5, 24)]
        );
        assert_eq!(
            projection.next_ovulations,
            vec![date(2024, 3, 13), date(2024, 4, 11), date(2024, 5, 10)]
        );
    }

    #[test]
    fn projections_step_by_average() {
        let projection = Projection::from_latest(Some(date(2024, 1, 1)), 28, 12).unwrap();
        for dates in [&projection.next_periods, &projection.next_ovulations] {
            assert_eq!(dates.len(), 3);
            for pair in dates.windows(2) {
                assert_eq!((pair[1] - pair[0]).num_days(), 28);
            }
        }
        assert_eq!(projection.next_ovulations[0], date(2024, 1, 17));
    }

    #[test]
    fn no_periods_means_no_projection() {
        let projection = Projection::from_latest(None, 28, 14).unwrap();
        assert!(projection.next_periods.is_empty());
        assert!(projection.next_ovulations.is_empty());
    }

    #[test]
    fn dates_past_the_calendar_end_are_an_error() {
        let err = Projection::from_latest(Some(NaiveDate::MAX), 28, 14).unwrap_err();
        assert!(matches!(err, AppError::ProjectionOutOfRange(d) if d == NaiveDate::MAX));
    }

    #[test]
    fn extreme_inputs_do_not_overflow() {
        let start = date(2024, 1, 1);
        for (average, luteal) in [(28, i32::MIN), (i32::MAX, 14), (i32::MIN, i32::MAX)] {
            assert!(matches!(
                Projection::from_latest(Some(start), average, luteal),
                Err(AppError::ProjectionOutOfRange(_))
            ));
        }
    }

    #[test]
    fn current_cycle_counts_days_since_start() {
        let today = date(2024, 3, 10);
        assert_eq!(current_cycle_length(Some(date(2024, 2, 27)), today), Some(12));
        assert_eq!(current_cycle_length(Some(today), today), Some(0));
        assert_eq!(current_cycle_length(None, today), None);
    }
}

use serde::{ Serialize, Deserialize };
use uuid::Uuid;
use chrono::{NaiveDate, NaiveTime, DateTime, Utc};

pub const DEFAULT_LUTEAL_PHASE_LENGTH: i32 = 14;
pub const DEFAULT_AVERAGE_CYCLE_LENGTH: i32 = 28;
pub const MAX_LUTEAL_PHASE_LENGTH: i32 = DEFAULT_AVERAGE_CYCLE_LENGTH;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub luteal_phase_length: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            luteal_phase_length: DEFAULT_LUTEAL_PHASE_LENGTH,
            created_at: Utc::now(),
        }
    }

    /// First and last name, or the email when both are blank.
    pub fn full_name(&self) -> String {
        let full_name = format!("{} {}", self.first_name, self.last_name);
        let full_name = full_name.trim();
        if full_name.is_empty() {
            self.email.clone()
        } else {
            full_name.to_string()
        }
    }
}

/// One recorded period start. `length` is the number of days until the
/// user's next period, `None` for the most recent one.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Period {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub length: Option<i32>,
}

impl Period {
    pub fn new(user_id: Uuid, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            start_date,
            start_time: None,
            length: None,
        }
    }

    pub fn describe(&self, owner: &User) -> String {
        match self.start_time {
            Some(time) => format!("{} ({} {})", owner.full_name(), self.start_date, time),
            None => format!("{} ({})", owner.full_name(), self.start_date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Statistics {
    pub user_id: Uuid,
    pub average_cycle_length: i32,
}

impl Statistics {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            average_cycle_length: DEFAULT_AVERAGE_CYCLE_LENGTH,
        }
    }

    pub fn describe(&self, owner: &User) -> String {
        format!("{} (avg: {})", owner.full_name(), self.average_cycle_length)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub luteal_phase_length: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub luteal_phase_length: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct NewPeriod {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
}

/// Full replacement of a period's user-editable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodUpdate {
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
}

/// Inclusive bounds on `start_date`; either side may be open.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

#[derive(Debug, Serialize)]
pub struct StatisticsSummary {
    pub average_cycle_length: i32,
    /// Days since the last period started, `-1` when no period is recorded.
    pub current_cycle_length: i64,
    pub next_periods: Vec<NaiveDate>,
    pub next_ovulations: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthCount {
    pub length: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleLengthEntry {
    pub start_date: NaiveDate,
    pub length: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_falls_back_to_email() {
        let mut user = User::new("jane@example.com");
        assert_eq!(user.full_name(), "jane@example.com");

        user.first_name = "Jane".into();
        assert_eq!(user.full_name(), "Jane");

        user.last_name = "Doe".into();
        assert_eq!(user.full_name(), "Jane Doe");
    }

    #[test]
    fn describe_includes_start_time_when_known() {
        let mut user = User::new("jane@example.com");
        user.first_name = "Jane".into();
        let mut period = Period::new(user.id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(period.describe(&user), "Jane (2024-01-01)");

        period.start_time = NaiveTime::from_hms_opt(8, 30, 0);
        assert_eq!(period.describe(&user), "Jane (2024-01-01 08:30:00)");

        let stats = Statistics::new(user.id);
        assert_eq!(stats.describe(&user), "Jane (avg: 28)");
    }

    #[test]
    fn open_range_contains_everything() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(DateRange::default().contains(date));

        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 3, 1),
            to: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        assert!(range.contains(date));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
    }
}

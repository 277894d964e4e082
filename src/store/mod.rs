//! Persistence for users, periods and statistics.
//!
//! The cycle engine only talks to [`PeriodStore`]. A store value represents
//! one unit of work: `PgStore` wraps a single transaction, `MemoryStore` is
//! the in-process backend used by tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{DateRange, Period, Statistics, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait PeriodStore: Send {
    async fn get_user(&mut self, id: Uuid) -> Result<Option<User>>;

    async fn insert_user(&mut self, user: &User) -> Result<()>;

    async fn update_user(&mut self, user: &User) -> Result<()>;

    /// Deletes the user together with their periods and statistics.
    /// Returns `false` when no such user existed.
    async fn delete_user(&mut self, id: Uuid) -> Result<bool>;

    async fn get_period(&mut self, id: Uuid) -> Result<Option<Period>>;

    async fn find_by_start_date(&mut self, user_id: Uuid, date: NaiveDate)
        -> Result<Option<Period>>;

    /// Latest period strictly before `date`.
    async fn find_previous(&mut self, user_id: Uuid, date: NaiveDate) -> Result<Option<Period>>;

    /// Earliest period strictly after `date`.
    async fn find_next(&mut self, user_id: Uuid, date: NaiveDate) -> Result<Option<Period>>;

    async fn latest_period(&mut self, user_id: Uuid) -> Result<Option<Period>>;

    /// Periods whose start date falls in `range`, ascending.
    async fn list_periods(&mut self, user_id: Uuid, range: DateRange) -> Result<Vec<Period>>;

    /// Plain write; never triggers any recalculation.
    async fn insert_period(&mut self, period: &Period) -> Result<()>;

    /// Plain write; never triggers any recalculation.
    async fn update_period(&mut self, period: &Period) -> Result<()>;

    async fn delete_period(&mut self, id: Uuid) -> Result<()>;

    /// Every non-null length of the user's periods.
    async fn all_lengths(&mut self, user_id: Uuid) -> Result<Vec<i32>>;

    /// Fails with [`crate::error::AppError::MissingStatistics`] when absent.
    async fn get_statistics(&mut self, user_id: Uuid) -> Result<Statistics>;

    async fn get_or_create_statistics(&mut self, user_id: Uuid) -> Result<Statistics>;

    async fn save_statistics(&mut self, stats: &Statistics) -> Result<()>;
}

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::PeriodStore;
use crate::error::{AppError, Result};
use crate::models::{DateRange, Period, Statistics, User};

const USER_COLUMNS: &str = "id, email, first_name, last_name, luteal_phase_length, created_at";
const PERIOD_COLUMNS: &str = "id, user_id, start_date, start_time, length";

/// Postgres-backed store bound to one transaction. Nothing is visible to
/// other connections until [`PgStore::commit`]; dropping the store rolls
/// every write back.
pub struct PgStore {
    tx: Transaction<'static, Postgres>,
}

/// Applies the bundled `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

impl PgStore {
    pub async fn begin(pool: &PgPool) -> Result<Self> {
        Ok(Self {
            tx: pool.begin().await?,
        })
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Row-locks the user so concurrent mutations of the same user's
    /// periods run one after the other.
    pub async fn lock_user(&mut self, user_id: Uuid) -> Result<()> {
        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        locked.map(|_| ()).ok_or(AppError::UserNotFound(user_id))
    }
}

#[async_trait]
impl PeriodStore for PgStore {
    async fn get_user(&mut self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn insert_user(&mut self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, first_name, last_name, luteal_phase_length, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.luteal_phase_length)
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::from_user_write(e, &user.email))?;
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET first_name = $2, last_name = $3, luteal_phase_length = $4
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.luteal_phase_length)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound(user.id));
        }
        Ok(())
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_period(&mut self, id: Uuid) -> Result<Option<Period>> {
        let sql = format!("SELECT {PERIOD_COLUMNS} FROM periods WHERE id = $1");
        let period = sqlx::query_as::<_, Period>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(period)
    }

    async fn find_by_start_date(
        &mut self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Period>> {
        let sql = format!(
            "SELECT {PERIOD_COLUMNS} FROM periods WHERE user_id = $1 AND start_date = $2"
        );
        let period = sqlx::query_as::<_, Period>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(period)
    }

    async fn find_previous(&mut self, user_id: Uuid, date: NaiveDate) -> Result<Option<Period>> {
        let sql = format!(
            "SELECT {PERIOD_COLUMNS} FROM periods
             WHERE user_id = $1 AND start_date < $2
             ORDER BY start_date DESC LIMIT 1"
        );
        let period = sqlx::query_as::<_, Period>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(period)
    }

    async fn find_next(&mut self, user_id: Uuid, date: NaiveDate) -> Result<Option<Period>> {
        let sql = format!(
            "SELECT {PERIOD_COLUMNS} FROM periods
             WHERE user_id = $1 AND start_date > $2
             ORDER BY start_date ASC LIMIT 1"
        );
        let period = sqlx::query_as::<_, Period>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(period)
    }

    async fn latest_period(&mut self, user_id: Uuid) -> Result<Option<Period>> {
        let sql = format!(
            "SELECT {PERIOD_COLUMNS} FROM periods WHERE user_id = $1
             ORDER BY start_date DESC LIMIT 1"
        );
        let period = sqlx::query_as::<_, Period>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(period)
    }

    async fn list_periods(&mut self, user_id: Uuid, range: DateRange) -> Result<Vec<Period>> {
        let sql = format!(
            "SELECT {PERIOD_COLUMNS} FROM periods
             WHERE user_id = $1
               AND ($2::date IS NULL OR start_date >= $2)
               AND ($3::date IS NULL OR start_date <= $3)
             ORDER BY start_date ASC"
        );
        let periods = sqlx::query_as::<_, Period>(&sql)
            .bind(user_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(periods)
    }

    async fn insert_period(&mut self, period: &Period) -> Result<()> {
        sqlx::query(
            "INSERT INTO periods (id, user_id, start_date, start_time, length)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(period.id)
        .bind(period.user_id)
        .bind(period.start_date)
        .bind(period.start_time)
        .bind(period.length)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::from_period_write(e, period.user_id, period.start_date))?;
        Ok(())
    }

    async fn update_period(&mut self, period: &Period) -> Result<()> {
        let result = sqlx::query(
            "UPDATE periods SET start_date = $2, start_time = $3, length = $4 WHERE id = $1",
        )
        .bind(period.id)
        .bind(period.start_date)
        .bind(period.start_time)
        .bind(period.length)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::from_period_write(e, period.user_id, period.start_date))?;
        if result.rows_affected() == 0 {
            return Err(AppError::PeriodNotFound(period.id));
        }
        Ok(())
    }

    async fn delete_period(&mut self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM periods WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn all_lengths(&mut self, user_id: Uuid) -> Result<Vec<i32>> {
        let lengths = sqlx::query_scalar::<_, i32>(
            "SELECT length FROM periods WHERE user_id = $1 AND length IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(lengths)
    }

    async fn get_statistics(&mut self, user_id: Uuid) -> Result<Statistics> {
        sqlx::query_as::<_, Statistics>(
            "SELECT user_id, average_cycle_length FROM statistics WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(AppError::MissingStatistics(user_id))
    }

    async fn get_or_create_statistics(&mut self, user_id: Uuid) -> Result<Statistics> {
        sqlx::query("INSERT INTO statistics (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        self.get_statistics(user_id).await
    }

    async fn save_statistics(&mut self, stats: &Statistics) -> Result<()> {
        sqlx::query("UPDATE statistics SET average_cycle_length = $2 WHERE user_id = $1")
            .bind(stats.user_id)
            .bind(stats.average_cycle_length)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}

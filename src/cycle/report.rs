//! Read-side views over a user's periods.

use chrono::NaiveDate;
use uuid::Uuid;

use super::projection::{self, Projection, UNKNOWN_CYCLE_LENGTH};
use super::stats;
use crate::error::{AppError, Result};
use crate::models::{
    CycleLengthEntry, DateRange, LengthCount, Period, Statistics, StatisticsSummary, User,
};
use crate::store::PeriodStore;

async fn require_user<S>(store: &mut S, user_id: Uuid) -> Result<User>
where
    S: PeriodStore + ?Sized,
{
    store
        .get_user(user_id)
        .await?
        .ok_or(AppError::UserNotFound(user_id))
}

/// The user's statistics. Every user gets a row on creation, so a missing
/// row surfaces as [`AppError::MissingStatistics`].
pub async fn statistics<S>(store: &mut S, user_id: Uuid) -> Result<Statistics>
where
    S: PeriodStore + ?Sized,
{
    require_user(store, user_id).await?;
    store.get_statistics(user_id).await
}

pub async fn projection<S>(store: &mut S, user_id: Uuid) -> Result<Projection>
where
    S: PeriodStore + ?Sized,
{
    let user = require_user(store, user_id).await?;
    let stats = statistics(store, user_id).await?;
    let latest = store.latest_period(user_id).await?;
    Projection::from_latest(
        latest.map(|p| p.start_date),
        stats.average_cycle_length,
        user.luteal_phase_length,
    )
}

pub async fn projected_periods<S>(store: &mut S, user_id: Uuid) -> Result<Vec<NaiveDate>>
where
    S: PeriodStore + ?Sized,
{
    Ok(projection(store, user_id).await?.next_periods)
}

pub async fn projected_ovulations<S>(store: &mut S, user_id: Uuid) -> Result<Vec<NaiveDate>>
where
    S: PeriodStore + ?Sized,
{
    Ok(projection(store, user_id).await?.next_ovulations)
}

/// Days since the user's latest period started, `None` without periods.
pub async fn current_cycle_length<S>(
    store: &mut S,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<Option<i64>>
where
    S: PeriodStore + ?Sized,
{
    require_user(store, user_id).await?;
    let latest = store.latest_period(user_id).await?;
    Ok(projection::current_cycle_length(
        latest.map(|p| p.start_date),
        today,
    ))
}

pub async fn summary<S>(store: &mut S, user_id: Uuid, today: NaiveDate) -> Result<StatisticsSummary>
where
    S: PeriodStore + ?Sized,
{
    let stats = statistics(store, user_id).await?;
    let projected = projection(store, user_id).await?;
    let current = current_cycle_length(store, user_id, today).await?;
    Ok(StatisticsSummary {
        average_cycle_length: stats.average_cycle_length,
        current_cycle_length: current.unwrap_or(UNKNOWN_CYCLE_LENGTH),
        next_periods: projected.next_periods,
        next_ovulations: projected.next_ovulations,
    })
}

pub async fn periods<S>(store: &mut S, user_id: Uuid, range: DateRange) -> Result<Vec<Period>>
where
    S: PeriodStore + ?Sized,
{
    require_user(store, user_id).await?;
    store.list_periods(user_id, range).await
}

pub async fn cycle_length_frequency<S>(store: &mut S, user_id: Uuid) -> Result<Vec<LengthCount>>
where
    S: PeriodStore + ?Sized,
{
    let periods = periods(store, user_id, DateRange::default()).await?;
    Ok(stats::length_frequency(&periods))
}

pub async fn cycle_length_history<S>(
    store: &mut S,
    user_id: Uuid,
) -> Result<Vec<CycleLengthEntry>>
where
    S: PeriodStore + ?Sized,
{
    let periods = periods(store, user_id, DateRange::default()).await?;
    Ok(stats::length_history(&periods))
}

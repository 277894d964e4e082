//! Mutation entry points for users and periods.
//!
//! Every period write goes through [`save_period`] or [`delete_period`], which
//! repair neighbouring lengths first and refresh the owner's statistics last.
//! Neighbour repairs are plain store writes, so they never re-enter this
//! module.

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use super::{length, stats};
use crate::error::{AppError, Result};
use crate::models::{
    NewPeriod, NewUser, Period, PeriodUpdate, Statistics, User, UserUpdate,
    MAX_LUTEAL_PHASE_LENGTH,
};
use crate::store::PeriodStore;

pub async fn create_user<S>(store: &mut S, new_user: NewUser) -> Result<User>
where
    S: PeriodStore + ?Sized,
{
    let mut user = User::new(new_user.email);
    user.first_name = new_user.first_name.unwrap_or_default();
    user.last_name = new_user.last_name.unwrap_or_default();
    if let Some(luteal) = new_user.luteal_phase_length {
        user.luteal_phase_length = validate_luteal_phase(luteal)?;
    }
    store.insert_user(&user).await?;
    on_user_created(store, &user).await?;
    info!(user_id = %user.id, "created user");
    Ok(user)
}

/// Gives a new user their statistics row unless one already exists.
pub async fn on_user_created<S>(store: &mut S, user: &User) -> Result<Statistics>
where
    S: PeriodStore + ?Sized,
{
    store.get_or_create_statistics(user.id).await
}

pub async fn update_user<S>(store: &mut S, user_id: Uuid, update: UserUpdate) -> Result<User>
where
    S: PeriodStore + ?Sized,
{
    let mut user = store
        .get_user(user_id)
        .await?
        .ok_or(AppError::UserNotFound(user_id))?;
    if let Some(first_name) = update.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = update.last_name {
        user.last_name = last_name;
    }
    if let Some(luteal) = update.luteal_phase_length {
        user.luteal_phase_length = validate_luteal_phase(luteal)?;
    }
    store.update_user(&user).await?;
    Ok(user)
}

/// Deletes the user and everything they own. The trailing statistics refresh
/// finds nothing to update and returns quietly.
pub async fn delete_user<S>(store: &mut S, user_id: Uuid) -> Result<()>
where
    S: PeriodStore + ?Sized,
{
    if !store.delete_user(user_id).await? {
        return Err(AppError::UserNotFound(user_id));
    }
    refresh_statistics(store, user_id).await?;
    info!(%user_id, "deleted user");
    Ok(())
}

pub async fn create_period<S>(store: &mut S, new_period: NewPeriod) -> Result<Period>
where
    S: PeriodStore + ?Sized,
{
    let owner = store
        .get_user(new_period.user_id)
        .await?
        .ok_or(AppError::UserNotFound(new_period.user_id))?;
    let mut period = Period::new(new_period.user_id, new_period.start_date);
    period.start_time = new_period.start_time;
    save_period(store, &mut period, true).await?;
    debug!("recorded {}", period.describe(&owner));
    Ok(period)
}

/// Replaces the editable fields of a period, keeping its identity.
pub async fn update_period<S>(store: &mut S, period_id: Uuid, update: PeriodUpdate) -> Result<Period>
where
    S: PeriodStore + ?Sized,
{
    let mut period = store
        .get_period(period_id)
        .await?
        .ok_or(AppError::PeriodNotFound(period_id))?;
    period.start_date = update.start_date;
    period.start_time = update.start_time;
    save_period(store, &mut period, true).await?;
    Ok(period)
}

/// Inserts or updates `period`.
///
/// With `propagate` set, a moved period is first detached from its old
/// neighbours, then its own length and the previous period's length are
/// derived at the new date, and finally the owner's average is refreshed.
/// Without it the record is written as is.
pub async fn save_period<S>(store: &mut S, period: &mut Period, propagate: bool) -> Result<()>
where
    S: PeriodStore + ?Sized,
{
    let existing = store.get_period(period.id).await?;

    if propagate {
        ensure_free_date(store, period).await?;
        if let Some(old) = existing
            .as_ref()
            .filter(|old| old.start_date != period.start_date)
        {
            debug!(period_id = %old.id, from = %old.start_date, to = %period.start_date, "moving period");
            on_period_deleted(store, old).await?;
        }
        on_period_saved(store, period).await?;
    }

    if existing.is_some() {
        store.update_period(period).await?;
    } else {
        store.insert_period(period).await?;
    }

    if propagate {
        refresh_statistics(store, period.user_id).await?;
        info!(period_id = %period.id, start_date = %period.start_date, "saved period");
    }
    Ok(())
}

/// Derives `period.length` from the next period and points the previous
/// period's length at `period.start_date`. Must run before `period` itself is
/// written.
pub async fn on_period_saved<S>(store: &mut S, period: &mut Period) -> Result<()>
where
    S: PeriodStore + ?Sized,
{
    let user_id = period.user_id;

    // A moved period's stale row may still be the nearest neighbour.
    let mut previous = store.find_previous(user_id, period.start_date).await?;
    if let Some(stale_date) = stale_start(previous.as_ref(), period) {
        previous = store.find_previous(user_id, stale_date).await?;
    }
    let mut next = store.find_next(user_id, period.start_date).await?;
    if let Some(stale_date) = stale_start(next.as_ref(), period) {
        next = store.find_next(user_id, stale_date).await?;
    }

    let fix = length::on_insert(previous, period.start_date, next.as_ref());
    period.length = fix.own_length;
    if let Some(previous) = fix.previous {
        debug!(period_id = %previous.id, length = ?previous.length, "updating previous period");
        store.update_period(&previous).await?;
    }
    Ok(())
}

pub async fn delete_period<S>(store: &mut S, period_id: Uuid) -> Result<Period>
where
    S: PeriodStore + ?Sized,
{
    let period = store
        .get_period(period_id)
        .await?
        .ok_or(AppError::PeriodNotFound(period_id))?;
    on_period_deleted(store, &period).await?;
    store.delete_period(period.id).await?;
    refresh_statistics(store, period.user_id).await?;
    info!(%period_id, start_date = %period.start_date, "deleted period");
    Ok(period)
}

/// Re-links the neighbours of `period` as if it were already gone. Must run
/// before `period` is removed or moved.
pub async fn on_period_deleted<S>(store: &mut S, period: &Period) -> Result<()>
where
    S: PeriodStore + ?Sized,
{
    let next = store.find_next(period.user_id, period.start_date).await?;
    let previous = store.find_previous(period.user_id, period.start_date).await?;
    if let Some(previous) = length::on_delete(previous, next.as_ref()) {
        debug!(period_id = %previous.id, length = ?previous.length, "re-linking previous period");
        store.update_period(&previous).await?;
    }
    Ok(())
}

/// Recomputes the user's average cycle length from every known length.
/// Returns `None` when the user has no statistics, e.g. mid-deletion.
pub async fn refresh_statistics<S>(store: &mut S, user_id: Uuid) -> Result<Option<Statistics>>
where
    S: PeriodStore + ?Sized,
{
    let mut statistics = match store.get_statistics(user_id).await {
        Ok(statistics) => statistics,
        Err(AppError::MissingStatistics(_)) => {
            debug!(%user_id, "no statistics to refresh");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    let lengths = store.all_lengths(user_id).await?;
    statistics.average_cycle_length =
        stats::recompute_average(statistics.average_cycle_length, &lengths);
    store.save_statistics(&statistics).await?;
    debug!(%user_id, average = statistics.average_cycle_length, "refreshed statistics");
    Ok(Some(statistics))
}

/// Rewrites every length of the user from their ordered start dates, then
/// refreshes the average. Returns how many periods changed.
pub async fn repair_lengths<S>(store: &mut S, user_id: Uuid) -> Result<usize>
where
    S: PeriodStore + ?Sized,
{
    if store.get_user(user_id).await?.is_none() {
        return Err(AppError::UserNotFound(user_id));
    }
    let periods = store.list_periods(user_id, Default::default()).await?;
    let dates: Vec<_> = periods.iter().map(|p| p.start_date).collect();
    let mut changed = 0;
    for (mut period, expected) in periods.into_iter().zip(length::expected_lengths(&dates)) {
        if period.length != expected {
            period.length = expected;
            save_period(store, &mut period, false).await?;
            changed += 1;
        }
    }
    refresh_statistics(store, user_id).await?;
    if changed > 0 {
        info!(%user_id, changed, "repaired period lengths");
    }
    Ok(changed)
}

/// Luteal phase length in days, at most one default cycle.
fn validate_luteal_phase(days: i32) -> Result<i32> {
    if (0..=MAX_LUTEAL_PHASE_LENGTH).contains(&days) {
        Ok(days)
    } else {
        Err(AppError::InvalidLutealPhase {
            value: days,
            max: MAX_LUTEAL_PHASE_LENGTH,
        })
    }
}

fn stale_start(neighbour: Option<&Period>, period: &Period) -> Option<NaiveDate> {
    neighbour
        .filter(|p| p.id == period.id)
        .map(|p| p.start_date)
}

async fn ensure_free_date<S>(store: &mut S, period: &Period) -> Result<()>
where
    S: PeriodStore + ?Sized,
{
    match store
        .find_by_start_date(period.user_id, period.start_date)
        .await?
    {
        Some(other) if other.id != period.id => Err(AppError::InvalidDate {
            user_id: period.user_id,
            start_date: period.start_date,
        }),
        _ => Ok(()),
    }
}

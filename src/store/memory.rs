use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::PeriodStore;
use crate::error::{AppError, Result};
use crate::models::{DateRange, Period, Statistics, User};

/// In-process store. Periods are kept ordered by `(user_id, start_date)`,
/// which doubles as the uniqueness constraint.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    users: HashMap<Uuid, User>,
    periods: BTreeMap<(Uuid, NaiveDate), Period>,
    period_keys: HashMap<Uuid, (Uuid, NaiveDate)>,
    statistics: HashMap<Uuid, Statistics>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_periods(&self, user_id: Uuid) -> impl DoubleEndedIterator<Item = &Period> + '_ {
        self.periods
            .range((user_id, NaiveDate::MIN)..=(user_id, NaiveDate::MAX))
            .map(|(_, period)| period)
    }

    fn ensure_user(&self, user_id: Uuid) -> Result<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(AppError::UserNotFound(user_id))
        }
    }
}

#[async_trait]
impl PeriodStore for MemoryStore {
    async fn get_user(&mut self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    async fn insert_user(&mut self, user: &User) -> Result<()> {
        if self.users.values().any(|u| u.email == user.email) {
            return Err(AppError::EmailTaken(user.email.clone()));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<()> {
        self.ensure_user(user.id)?;
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<bool> {
        if self.users.remove(&id).is_none() {
            return Ok(false);
        }
        self.periods.retain(|(user_id, _), _| *user_id != id);
        self.period_keys.retain(|_, (user_id, _)| *user_id != id);
        self.statistics.remove(&id);
        Ok(true)
    }

    async fn get_period(&mut self, id: Uuid) -> Result<Option<Period>> {
        Ok(self
            .period_keys
            .get(&id)
            .and_then(|key| self.periods.get(key))
            .cloned())
    }

    async fn find_by_start_date(
        &mut self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Period>> {
        Ok(self.periods.get(&(user_id, date)).cloned())
    }

    async fn find_previous(&mut self, user_id: Uuid, date: NaiveDate) -> Result<Option<Period>> {
        Ok(self
            .user_periods(user_id)
            .rev()
            .find(|p| p.start_date < date)
            .cloned())
    }

    async fn find_next(&mut self, user_id: Uuid, date: NaiveDate) -> Result<Option<Period>> {
        Ok(self
            .user_periods(user_id)
            .find(|p| p.start_date > date)
            .cloned())
    }

    async fn latest_period(&mut self, user_id: Uuid) -> Result<Option<Period>> {
        Ok(self.user_periods(user_id).next_back().cloned())
    }

    async fn list_periods(&mut self, user_id: Uuid, range: DateRange) -> Result<Vec<Period>> {
        Ok(self
            .user_periods(user_id)
            .filter(|p| range.contains(p.start_date))
            .cloned()
            .collect())
    }

    async fn insert_period(&mut self, period: &Period) -> Result<()> {
        self.ensure_user(period.user_id)?;
        let key = (period.user_id, period.start_date);
        if self.periods.contains_key(&key) {
            return Err(AppError::InvalidDate {
                user_id: period.user_id,
                start_date: period.start_date,
            });
        }
        self.periods.insert(key, period.clone());
        self.period_keys.insert(period.id, key);
        Ok(())
    }

    async fn update_period(&mut self, period: &Period) -> Result<()> {
        let old_key = *self
            .period_keys
            .get(&period.id)
            .ok_or(AppError::PeriodNotFound(period.id))?;
        let new_key = (period.user_id, period.start_date);
        if new_key != old_key && self.periods.contains_key(&new_key) {
            return Err(AppError::InvalidDate {
                user_id: period.user_id,
                start_date: period.start_date,
            });
        }
        self.periods.remove(&old_key);
        self.periods.insert(new_key, period.clone());
        self.period_keys.insert(period.id, new_key);
        Ok(())
    }

    async fn delete_period(&mut self, id: Uuid) -> Result<()> {
        if let Some(key) = self.period_keys.remove(&id) {
            self.periods.remove(&key);
        }
        Ok(())
    }

    async fn all_lengths(&mut self, user_id: Uuid) -> Result<Vec<i32>> {
        Ok(self.user_periods(user_id).filter_map(|p| p.length).collect())
    }

    async fn get_statistics(&mut self, user_id: Uuid) -> Result<Statistics> {
        self.statistics
            .get(&user_id)
            .cloned()
            .ok_or(AppError::MissingStatistics(user_id))
    }

    async fn get_or_create_statistics(&mut self, user_id: Uuid) -> Result<Statistics> {
        self.ensure_user(user_id)?;
        Ok(self
            .statistics
            .entry(user_id)
            .or_insert_with(|| Statistics::new(user_id))
            .clone())
    }

    async fn save_statistics(&mut self, stats: &Statistics) -> Result<()> {
        self.ensure_user(stats.user_id)?;
        self.statistics.insert(stats.user_id, stats.clone());
        Ok(())
    }
}

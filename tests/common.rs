#![allow(dead_code)]
use chrono::NaiveDate;
use periods_backend::cycle::orchestrator;
use periods_backend::models::{DateRange, NewPeriod, NewUser, Period, User};
use periods_backend::store::{MemoryStore, PeriodStore};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Fresh store with one user and their default statistics.
pub async fn store_with_user() -> (MemoryStore, User) {
    let mut store = MemoryStore::new();
    let user = orchestrator::create_user(
        &mut store,
        NewUser {
            email: "jane@example.com".into(),
            first_name: Some("Jane".into()),
            last_name: None,
            luteal_phase_length: None,
        },
    )
    .await
    .expect("create user");
    (store, user)
}

pub async fn add_period(store: &mut MemoryStore, user: &User, start: NaiveDate) -> Period {
    orchestrator::create_period(
        store,
        NewPeriod {
            user_id: user.id,
            start_date: start,
            start_time: None,
        },
    )
    .await
    .expect("create period")
}

/// `(start_date, length)` for every period of the user, ascending.
pub async fn lengths(store: &mut MemoryStore, user: &User) -> Vec<(NaiveDate, Option<i32>)> {
    store
        .list_periods(user.id, DateRange::default())
        .await
        .expect("list periods")
        .into_iter()
        .map(|p| (p.start_date, p.length))
        .collect()
}

pub async fn average(store: &mut MemoryStore, user: &User) -> i32 {
    store
        .get_statistics(user.id)
        .await
        .expect("statistics")
        .average_cycle_length
}

/// Asserts every stored length matches the gap to the following period.
pub async fn assert_lengths_consistent(store: &mut MemoryStore, user: &User) {
    let periods = lengths(store, user).await;
    for pair in periods.windows(2) {
        let expected = (pair[1].0 - pair[0].0).num_days() as i32;
        assert_eq!(pair[0].1, Some(expected), "length of {}", pair[0].0);
    }
    if let Some(last) = periods.last() {
        assert_eq!(last.1, None, "latest period {} must stay open", last.0);
    }
}

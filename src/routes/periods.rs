use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cycle::{orchestrator, report};
use crate::error::{AppError, Result};
use crate::models::{DateRange, NewPeriod, Period, PeriodUpdate};
use crate::store::{PeriodStore, PgStore};

#[derive(Deserialize)]
pub struct PeriodQuery {
    pub user_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub fn routes(pool: PgPool) -> Router {
    Router::new()
        .route("/periods", get(list_periods).post(create_period))
        .route(
            "/periods/:id",
            get(get_period).put(update_period).delete(delete_period),
        )
        .with_state(pool)
}

async fn create_period(
    State(pool): State<PgPool>,
    Json(body): Json<NewPeriod>,
) -> Result<(StatusCode, Json<Period>)> {
    let mut store = PgStore::begin(&pool).await?;
    store.lock_user(body.user_id).await?;
    let period = orchestrator::create_period(&mut store, body).await?;
    store.commit().await?;
    Ok((StatusCode::CREATED, Json(period)))
}

async fn list_periods(
    State(pool): State<PgPool>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Vec<Period>>> {
    let range = DateRange {
        from: params.from,
        to: params.to,
    };
    let mut store = PgStore::begin(&pool).await?;
    let periods = report::periods(&mut store, params.user_id, range).await?;
    store.commit().await?;
    Ok(Json(periods))
}

async fn get_period(State(pool): State<PgPool>, Path(id): Path<Uuid>) -> Result<Json<Period>> {
    let mut store = PgStore::begin(&pool).await?;
    let period = store
        .get_period(id)
        .await?
        .ok_or(AppError::PeriodNotFound(id))?;
    store.commit().await?;
    Ok(Json(period))
}

async fn update_period(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(body): Json<PeriodUpdate>,
) -> Result<Json<Period>> {
    let mut store = PgStore::begin(&pool).await?;
    lock_owner(&mut store, id).await?;
    let period = orchestrator::update_period(&mut store, id, body).await?;
    store.commit().await?;
    Ok(Json(period))
}

async fn delete_period(State(pool): State<PgPool>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let mut store = PgStore::begin(&pool).await?;
    lock_owner(&mut store, id).await?;
    orchestrator::delete_period(&mut store, id).await?;
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn lock_owner(store: &mut PgStore, period_id: Uuid) -> Result<()> {
    let period = store
        .get_period(period_id)
        .await?
        .ok_or(AppError::PeriodNotFound(period_id))?;
    store.lock_user(period.user_id).await
}

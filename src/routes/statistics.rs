use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cycle::report;
use crate::error::Result;
use crate::models::{CycleLengthEntry, LengthCount, StatisticsSummary};
use crate::store::PgStore;

#[derive(Deserialize)]
pub struct StatisticsQuery {
    user_id: Uuid,
}

pub async fn get_statistics(
    State(pool): State<PgPool>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsSummary>> {
    let today = chrono::Utc::now().naive_utc().date();
    let mut store = PgStore::begin(&pool).await?;
    let summary = report::summary(&mut store, query.user_id, today).await?;
    store.commit().await?;
    Ok(Json(summary))
}

pub async fn get_cycle_length_frequency(
    State(pool): State<PgPool>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<Vec<LengthCount>>> {
    let mut store = PgStore::begin(&pool).await?;
    let frequency = report::cycle_length_frequency(&mut store, query.user_id).await?;
    store.commit().await?;
    Ok(Json(frequency))
}

pub async fn get_cycle_length_history(
    State(pool): State<PgPool>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<Vec<CycleLengthEntry>>> {
    let mut store = PgStore::begin(&pool).await?;
    let history = report::cycle_length_history(&mut store, query.user_id).await?;
    store.commit().await?;
    Ok(Json(history))
}

pub fn routes(pool: PgPool) -> Router {
    Router::new()
        .route("/statistics", get(get_statistics))
        .route("/statistics/cycle_length_frequency", get(get_cycle_length_frequency))
        .route("/statistics/cycle_length_history", get(get_cycle_length_history))
        .with_state(pool)
}

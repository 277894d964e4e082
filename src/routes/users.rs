use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cycle::orchestrator;
use crate::error::Result;
use crate::models::{NewUser, User, UserUpdate};
use crate::store::PgStore;

#[derive(Serialize)]
pub struct RepairResponse {
    pub changed: usize,
}

pub fn routes(pool: PgPool) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", patch(update_user).delete(delete_user))
        .route("/users/:id/repair_lengths", post(repair_lengths))
        .with_state(pool)
}

async fn create_user(
    State(pool): State<PgPool>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    let mut store = PgStore::begin(&pool).await?;
    let user = orchestrator::create_user(&mut store, body).await?;
    store.commit().await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(body): Json<UserUpdate>,
) -> Result<Json<User>> {
    let mut store = PgStore::begin(&pool).await?;
    store.lock_user(id).await?;
    let user = orchestrator::update_user(&mut store, id, body).await?;
    store.commit().await?;
    Ok(Json(user))
}

async fn delete_user(State(pool): State<PgPool>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let mut store = PgStore::begin(&pool).await?;
    store.lock_user(id).await?;
    orchestrator::delete_user(&mut store, id).await?;
    store.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn repair_lengths(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<RepairResponse>> {
    let mut store = PgStore::begin(&pool).await?;
    store.lock_user(id).await?;
    let changed = orchestrator::repair_lengths(&mut store, id).await?;
    store.commit().await?;
    Ok(Json(RepairResponse { changed }))
}

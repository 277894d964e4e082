//! Error types shared by the store, the cycle engine and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

const PERIOD_DATE_CONSTRAINT: &str = "periods_user_start_date_key";
const USER_EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Error, Debug)]
pub enum AppError {
    /// A period already exists for this user on this date.
    #[error("a period starting on {start_date} already exists for user {user_id}")]
    InvalidDate { user_id: Uuid, start_date: NaiveDate },

    /// The user has no statistics row, e.g. while the user is being deleted.
    #[error("no statistics for user {0}")]
    MissingStatistics(Uuid),

    #[error("luteal phase length must be between 0 and {max} days, got {value}")]
    InvalidLutealPhase { value: i32, max: i32 },

    /// A projected date falls outside the supported calendar.
    #[error("projection from {0} leaves the supported date range")]
    ProjectionOutOfRange(NaiveDate),

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    #[error("period not found: {0}")]
    PeriodNotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Maps a unique violation on `(user_id, start_date)` to [`AppError::InvalidDate`].
    pub fn from_period_write(err: sqlx::Error, user_id: Uuid, start_date: NaiveDate) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.constraint() == Some(PERIOD_DATE_CONSTRAINT) {
                return AppError::InvalidDate { user_id, start_date };
            }
        }
        AppError::Database(err)
    }

    /// Maps a unique violation on `users.email` to [`AppError::EmailTaken`].
    pub fn from_user_write(err: sqlx::Error, email: &str) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.constraint() == Some(USER_EMAIL_CONSTRAINT) {
                return AppError::EmailTaken(email.to_string());
            }
        }
        AppError::Database(err)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidDate { .. }
            | AppError::InvalidLutealPhase { .. }
            | AppError::ProjectionOutOfRange(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmailTaken(_) => StatusCode::CONFLICT,
            AppError::UserNotFound(_)
            | AppError::PeriodNotFound(_)
            | AppError::MissingStatistics(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Migration(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("❌ {}", self);
            "internal error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_date_is_unprocessable() {
        let err = AppError::InvalidDate {
            user_id: Uuid::nil(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().contains("2024-01-01"));
    }

    #[test]
    fn lookups_map_to_not_found() {
        assert_eq!(
            AppError::PeriodNotFound(Uuid::nil()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::UserNotFound(Uuid::nil()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn client_input_errors_are_not_server_errors() {
        let luteal = AppError::InvalidLutealPhase { value: -3, max: 28 };
        assert_eq!(luteal.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let range = AppError::ProjectionOutOfRange(NaiveDate::MAX);
        assert_eq!(range.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let email = AppError::EmailTaken("jane@example.com".into());
        assert_eq!(email.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn migration_failures_are_server_errors() {
        let err = AppError::from(sqlx::migrate::MigrateError::VersionMissing(1));
        assert!(matches!(err, AppError::Migration(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_database_errors_are_not_remapped() {
        let err = AppError::from_user_write(sqlx::Error::PoolClosed, "jane@example.com");
        assert!(matches!(err, AppError::Database(sqlx::Error::PoolClosed)));

        let err = AppError::from_period_write(
            sqlx::Error::RowNotFound,
            Uuid::nil(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}

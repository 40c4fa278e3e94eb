use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::gateway::GatewayError;
use crate::scheduling::{Collision, ScheduleError};

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    Schedule(ScheduleError),
    ServiceUnavailable(String),
    Internal(String),
}

fn conflict_body(collision: &Collision) -> serde_json::Value {
    json!({
        "classId": collision.class_id,
        "name": collision.name,
        "scope": collision.scope.as_str(),
        "start": collision.start,
        "end": collision.end,
    })
}

impl ApiError {
    fn status_and_code(err: &ScheduleError) -> (StatusCode, &'static str) {
        match err {
            ScheduleError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ScheduleError::ClassNotFound(_) | ScheduleError::BookingNotFound(_) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ScheduleError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ScheduleError::InvalidState(_) => (StatusCode::BAD_REQUEST, "INVALID_STATE"),
            ScheduleError::PastClass => (StatusCode::BAD_REQUEST, "PAST_CLASS"),
            ScheduleError::ScheduleConflict(_) => (StatusCode::CONFLICT, "SCHEDULE_CONFLICT"),
            ScheduleError::ClassFull { .. } | ScheduleError::CapacityBelowOccupancy { .. } => {
                (StatusCode::CONFLICT, "CAPACITY_ERROR")
            }
            ScheduleError::DuplicateBooking => (StatusCode::CONFLICT, "DUPLICATE_BOOKING"),
            ScheduleError::SubscriptionRequired => {
                (StatusCode::FORBIDDEN, "SUBSCRIPTION_REQUIRED")
            }
            ScheduleError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ScheduleError::TooLate { .. } => (StatusCode::BAD_REQUEST, "TOO_LATE"),
            ScheduleError::HasActiveBookings { .. } => {
                (StatusCode::CONFLICT, "HAS_ACTIVE_BOOKINGS")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": msg, "code": "UNAUTHORIZED" }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "code": "VALIDATION_ERROR" }),
            ),
            ApiError::Schedule(err) => {
                let (status, code) = Self::status_and_code(&err);
                let mut body = json!({ "error": err.to_string(), "code": code });
                if let ScheduleError::ScheduleConflict(collision) = &err {
                    body["conflict"] = conflict_body(collision);
                }
                (status, body)
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": msg, "code": "SERVICE_UNAVAILABLE" }),
            ),
            ApiError::Internal(msg) => {
                error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An internal error occurred", "code": "INTERNAL_ERROR" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        ApiError::Schedule(value)
    }
}

impl From<GatewayError> for ApiError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::Unauthorized => {
                ApiError::Unauthorized("Invalid authentication token".into())
            }
            GatewayError::Http(err) => {
                error!("auth service unreachable: {err}");
                ApiError::ServiceUnavailable("Authentication service unavailable".into())
            }
            GatewayError::Status(status) => {
                error!("auth service answered {status}");
                ApiError::ServiceUnavailable("Authentication service unavailable".into())
            }
            GatewayError::Url(err) => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::scheduling::ConflictScope;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_conflict_response_carries_collision() {
        let class_id = Uuid::new_v4();
        let err = ApiError::from(ScheduleError::ScheduleConflict(Collision {
            scope: ConflictScope::Monitor,
            class_id,
            name: "Boxing".into(),
            start: Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 10, 11, 0, 0).unwrap(),
        }));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["code"], "SCHEDULE_CONFLICT");
        assert_eq!(body["conflict"]["scope"], "monitor");
        assert_eq!(body["conflict"]["classId"], class_id.to_string());
    }

    #[tokio::test]
    async fn test_stable_codes() {
        let cases = [
            (ScheduleError::DuplicateBooking, StatusCode::CONFLICT, "DUPLICATE_BOOKING"),
            (ScheduleError::PastClass, StatusCode::BAD_REQUEST, "PAST_CLASS"),
            (
                ScheduleError::SubscriptionRequired,
                StatusCode::FORBIDDEN,
                "SUBSCRIPTION_REQUIRED",
            ),
            (
                ScheduleError::HasActiveBookings { count: 2 },
                StatusCode::CONFLICT,
                "HAS_ACTIVE_BOOKINGS",
            ),
        ];
        for (err, status, code) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
            assert_eq!(body_json(response).await["code"], code);
        }
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let response = ApiError::Internal("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "An internal error occurred");
    }
}

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidInput(_) | DomainError::InsufficientStock { .. } => {
                AppError::BadRequest(e.to_string())
            }
            DomainError::CustomerNotFound(_)
            | DomainError::OrderNotFound(_)
            | DomainError::ProductNotFound(_) => AppError::NotFound(e.to_string()),
            DomainError::CannotConfirmCanceled
            | DomainError::CancelWindowExpired { .. }
            | DomainError::IdempotencyKeyMismatch { .. }
            | DomainError::Conflict(_) => AppError::Conflict(e.to_string()),
            DomainError::DuplicateIdempotencyKey(_) | DomainError::Internal(_) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(detail) => {
                log::error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": message
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("Order not found".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn internal_error_body_hides_detail() {
        let resp = AppError::Internal("db password wrong".to_string()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn client_error_body_carries_message() {
        let err: AppError = DomainError::CannotConfirmCanceled.into();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Cannot confirm a canceled order");
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let app_err: AppError = DomainError::OrderNotFound(3).into();
        assert!(matches!(app_err, AppError::NotFound(_)));
        let app_err: AppError = DomainError::CustomerNotFound(3).into();
        assert!(matches!(app_err, AppError::NotFound(_)));
    }

    #[test]
    fn insufficient_stock_is_a_client_error() {
        let app_err: AppError = DomainError::InsufficientStock {
            product_id: 10,
            requested: 3,
            available: 1,
        }
        .into();
        assert!(matches!(app_err, AppError::BadRequest(ref m) if m == "Insufficient stock for product 10"));
    }

    #[test]
    fn expired_cancel_window_is_a_conflict() {
        let app_err: AppError = DomainError::CancelWindowExpired { window_minutes: 10 }.into();
        assert_eq!(
            app_err.to_string(),
            "Cannot cancel order confirmed more than 10 minutes ago"
        );
        assert!(matches!(app_err, AppError::Conflict(_)));
    }

    #[test]
    fn domain_internal_maps_to_app_internal() {
        let app_err: AppError = DomainError::Internal("oops".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}

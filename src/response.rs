use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

/// Paging information attached to list responses. Single-item responses
/// carry it with every field unset.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Default)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
    pub total_pages: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
            total_pages: Some(total_pages),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// The single envelope every endpoint answers with, errors included.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(message, data, Some(Meta::empty()))
    }
}

/// Wraps an envelope so the handler answers `201 Created`.
pub struct Created<T>(pub ApiResponse<T>);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_counts_partial_last_page() {
        let meta = Meta::new(2, 20, 41);
        assert_eq!(meta.total_pages, Some(3));
        assert_eq!(Meta::new(1, 20, 0).total_pages, Some(0));
        assert_eq!(Meta::empty().page, None);
    }

    #[test]
    fn envelope_serializes_message_data_and_meta() {
        let body = serde_json::to_value(ApiResponse::ok("Food", 7)).unwrap();
        assert_eq!(body["message"], "Food");
        assert_eq!(body["data"], 7);
        assert!(body["meta"]["page"].is_null());
    }
}

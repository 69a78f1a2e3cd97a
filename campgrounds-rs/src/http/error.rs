use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::schema::ValidationErrors;

use super::pages;

/// Hard failures that surface as an HTTP error status. Business-rule violations
/// (not found, not the owner, duplicate registration) never land here; those are
/// flash + redirect.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Html(pages::error_page(status, &self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::schema::ValidationErrors;

    use super::AppError;

    #[test]
    fn validation_maps_to_bad_request_and_keeps_field_names() {
        let error = AppError::from(ValidationErrors {
            messages: vec![String::from("title is required")],
        });
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("title"));
    }
}

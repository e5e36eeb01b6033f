//! API response types.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// CSV file download response.
///
/// Serves the body as `text/csv` with an attachment disposition so
/// browsers save it under the given filename.
pub struct CsvFile {
    /// Suggested download filename
    pub filename: String,
    /// CSV body
    pub content: String,
}

impl IntoResponse for CsvFile {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
            ],
            self.content,
        )
            .into_response()
    }
}

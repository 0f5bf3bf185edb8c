use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pipeline_core::IngestError;
use pipeline_types::ErrorKind;

/// Translates the ingestor's closed error set into the two HTTP statuses
/// the webhook boundary is allowed to return for a rejection (spec §6):
/// `400` for a malformed payload, `401` for a signature mismatch.
/// Everything else is absorbed inside the ingestor itself and never
/// reaches this type.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct WebhookApiError(#[from] IngestError);

impl WebhookApiError {
	#[must_use]
	pub const fn status_code(&self) -> StatusCode {
		match self.0.kind() {
			ErrorKind::Signature => StatusCode::UNAUTHORIZED,
			_ => StatusCode::BAD_REQUEST,
		}
	}
}

impl IntoResponse for WebhookApiError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		(status, self.0.to_string()).into_response()
	}
}

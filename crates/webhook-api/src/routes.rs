use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use pipeline_core::WebhookIngestor;

use crate::error::WebhookApiError;
use crate::state::WebhookApiState;

/// The header the provider carries its HMAC-SHA256 signature in (spec §6:
/// `x-<provider>-signature`). AssemblyAI is the provider this workspace
/// targets (see `transcription-client`'s default base URL).
const SIGNATURE_HEADER: &str = "x-assemblyai-signature";

/// Mounts the single synchronous external entry point into the core (spec
/// §6): `POST /webhooks/transcription`.
pub fn router(state: Arc<WebhookApiState>) -> Router {
	Router::new().route("/webhooks/transcription", post(post_webhook)).with_state(state)
}

#[tracing::instrument(skip(state, headers, body))]
async fn post_webhook(State(state): State<Arc<WebhookApiState>>, headers: HeaderMap, body: Bytes) -> Result<StatusCode, WebhookApiError> {
	let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

	let ingestor = WebhookIngestor {
		job_store: &state.job_store,
		transcription_client: &state.transcription_client,
		meeting_context: state.meeting_context.as_ref(),
		default_language: &state.default_language,
		verify_signature: state.verify_signature,
	};

	ingestor.handle(&body, signature).await?;
	Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use axum::body::Body;
	use axum::http::Request;
	use hmac::{Hmac, Mac};
	use job_store::JobStore;
	use pipeline_core::NullMeetingContext;
	use pipeline_types::job::NewJob;
	use pipeline_types::JobType;
	use sha2::Sha256;
	use sqlx::sqlite::SqlitePoolOptions;
	use tower::ServiceExt;
	use transcription_client::TranscriptionClient;

	use super::*;

	async fn test_store() -> JobStore {
		let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.expect("pool");
		let store = JobStore::new(pool);
		store.run_migrations().await.expect("migrations");
		store
	}

	fn state(store: JobStore, client: TranscriptionClient, verify_signature: bool) -> Arc<WebhookApiState> {
		Arc::new(WebhookApiState { job_store: store, transcription_client: client, meeting_context: Arc::new(NullMeetingContext), default_language: "vi".to_string(), verify_signature })
	}

	#[tokio::test]
	async fn malformed_payload_returns_400() {
		let store = test_store().await;
		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", None);
		let app = router(state(store, client, false));

		let resp = app.oneshot(Request::builder().method("POST").uri("/webhooks/transcription").body(Body::from(r#"{"status":"completed"}"#)).unwrap()).await.unwrap();

		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn unmatched_job_still_returns_200() {
		let store = test_store().await;
		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", None);
		let app = router(state(store, client, false));

		let resp = app
			.oneshot(Request::builder().method("POST").uri("/webhooks/transcription").body(Body::from(r#"{"id":"tx_unknown","status":"processing"}"#)).unwrap())
			.await
			.unwrap();

		assert_eq!(resp.status(), StatusCode::OK);
	}

	#[tokio::test]
	async fn signature_mismatch_returns_401() {
		let store = test_store().await;
		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", Some("shh".to_string()));
		let app = router(state(store, client, true));

		let resp = app
			.oneshot(
				Request::builder()
					.method("POST")
					.uri("/webhooks/transcription")
					.header(SIGNATURE_HEADER, "deadbeef")
					.body(Body::from(r#"{"id":"tx_A","status":"processing"}"#))
					.unwrap(),
			)
			.await
			.unwrap();

		assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn valid_signature_and_known_job_returns_200() {
		let store = test_store().await;
		let meeting_id = uuid::Uuid::new_v4();
		let job = store.create(NewJob { meeting_id, job_type: JobType::Transcription, recording_url: "https://example.com/a.mp3".to_string(), max_retries: 3 }).await.unwrap();
		store.claim_pending(10).await.unwrap();
		store.mark_submitted(job.id, "tx_A").await.unwrap();

		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", Some("shh".to_string()));
		let app = router(state(store, client, true));

		let payload = br#"{"id":"tx_A","status":"processing"}"#;
		let mut mac = Hmac::<Sha256>::new_from_slice(b"shh").unwrap();
		mac.update(payload);
		let sig = hex::encode(mac.finalize().into_bytes());

		let resp = app
			.oneshot(Request::builder().method("POST").uri("/webhooks/transcription").header(SIGNATURE_HEADER, sig).body(Body::from(payload.to_vec())).unwrap())
			.await
			.unwrap();

		assert_eq!(resp.status(), StatusCode::OK);
	}
}

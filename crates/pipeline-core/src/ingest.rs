use job_store::JobStore;
use pipeline_types::{ErrorKind, JobStatus};
use transcription_client::{ProviderStatus, TranscriptionClient, WebhookEnvelope};

use crate::completion::persist_completed_transcript;
use crate::meeting_context::MeetingContext;

/// Failure modes the webhook boundary itself must surface as an HTTP
/// status (spec §6, §7). Everything else — an unmatched job, a provider
/// error status, a fetch failure — is absorbed and reported `200` so the
/// provider stops retrying once our internal state reflects the event.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
	#[error("malformed webhook payload: {0}")]
	Protocol(String),

	#[error("webhook signature did not match")]
	Signature,
}

impl IngestError {
	#[must_use]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::Protocol(_) => ErrorKind::Protocol,
			Self::Signature => ErrorKind::Signature,
		}
	}
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Shared logic behind component C6 (spec §4.6), reused verbatim by the
/// `webhook-api` HTTP boundary and by the webhook-timeout poller (C8)
/// driving the same completion path when the webhook itself never
/// arrives (law L3).
pub struct WebhookIngestor<'a> {
	pub job_store: &'a JobStore,
	pub transcription_client: &'a TranscriptionClient,
	pub meeting_context: &'a dyn MeetingContext,
	pub default_language: &'a str,
	pub verify_signature: bool,
}

impl<'a> WebhookIngestor<'a> {
	/// Verifies, decodes, and applies one webhook delivery. Idempotent —
	/// replaying the same delivery any number of times converges to the
	/// same terminal state (law L2).
	#[tracing::instrument(skip(self, payload, signature))]
	pub async fn handle(&self, payload: &[u8], signature: Option<&str>) -> Result<()> {
		if self.verify_signature && !self.transcription_client.verify_webhook(payload, signature) {
			return Err(IngestError::Signature);
		}

		let envelope: WebhookEnvelope = serde_json::from_slice(payload).map_err(|e| IngestError::Protocol(e.to_string()))?;
		let Some(external_id) = envelope.external_id() else {
			return Err(IngestError::Protocol("payload carries neither transcript_id nor id".to_string()));
		};

		let Ok(Some(job)) = self.job_store.find_by_external_id(external_id).await else {
			// Provider is reporting on a job we don't recognize. Not fatal
			// upstream — the provider should stop retrying — but worth
			// recording as an anomaly.
			tracing::warn!(external_id, "webhook for unknown external_job_id");
			return Ok(());
		};

		match envelope.status {
			ProviderStatus::Queued => {}
			ProviderStatus::Processing => {
				let _ = self.job_store.update_status(job.id, JobStatus::Processing).await;
			}
			ProviderStatus::Completed => {
				if let Ok(fetched) = self.transcription_client.get(external_id).await {
					if let Err(e) = persist_completed_transcript(self.job_store, self.meeting_context, &job, fetched, self.default_language).await {
						tracing::error!(job_id = %job.id, error = %e, "failed to persist completed transcript from webhook");
					}
				} else {
					tracing::error!(job_id = %job.id, "webhook reported completed but re-fetch failed");
				}
			}
			ProviderStatus::Error => {
				let _ = self.job_store.mark_failed(job.id, envelope.error.as_deref().unwrap_or("transcription provider reported an error")).await;
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pipeline_types::job::NewJob;
	use pipeline_types::JobType;
	use sqlx::sqlite::SqlitePoolOptions;

	use crate::meeting_context::NullMeetingContext;

	async fn store() -> JobStore {
		let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.expect("pool");
		let store = JobStore::new(pool);
		store.run_migrations().await.expect("migrations");
		store
	}

	#[tokio::test]
	async fn rejects_payload_missing_both_ids() {
		let store = store().await;
		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", None);
		let ingestor = WebhookIngestor { job_store: &store, transcription_client: &client, meeting_context: &NullMeetingContext, default_language: "vi", verify_signature: false };

		let err = ingestor.handle(br#"{"status":"completed"}"#, None).await.expect_err("must reject");
		assert_eq!(err.kind(), ErrorKind::Protocol);
	}

	#[tokio::test]
	async fn unknown_external_id_is_absorbed_not_rejected() {
		let store = store().await;
		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", None);
		let ingestor = WebhookIngestor { job_store: &store, transcription_client: &client, meeting_context: &NullMeetingContext, default_language: "vi", verify_signature: false };

		let result = ingestor.handle(br#"{"id":"tx_unknown","status":"processing"}"#, None).await;
		assert!(result.is_ok(), "an unmatched job is an anomaly, not a protocol error");
	}

	#[tokio::test]
	async fn processing_status_transitions_job() {
		let store = store().await;
		let meeting_id = uuid::Uuid::new_v4();
		let job = store.create(NewJob { meeting_id, job_type: JobType::Transcription, recording_url: "https://example.com/a.mp3".to_string(), max_retries: 3 }).await.unwrap();
		store.claim_pending(10).await.unwrap();
		store.mark_submitted(job.id, "tx_A").await.unwrap();

		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", None);
		let ingestor = WebhookIngestor { job_store: &store, transcription_client: &client, meeting_context: &NullMeetingContext, default_language: "vi", verify_signature: false };

		ingestor.handle(br#"{"id":"tx_A","status":"processing"}"#, None).await.expect("accepted");

		let updated = store.get(job.id).await.unwrap().unwrap();
		assert_eq!(updated.status, JobStatus::Processing);
	}

	#[tokio::test]
	async fn error_status_marks_job_failed() {
		let store = store().await;
		let meeting_id = uuid::Uuid::new_v4();
		let job = store.create(NewJob { meeting_id, job_type: JobType::Transcription, recording_url: "https://example.com/b.mp3".to_string(), max_retries: 3 }).await.unwrap();
		store.claim_pending(10).await.unwrap();
		store.mark_submitted(job.id, "tx_B").await.unwrap();

		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", None);
		let ingestor = WebhookIngestor { job_store: &store, transcription_client: &client, meeting_context: &NullMeetingContext, default_language: "vi", verify_signature: false };

		ingestor.handle(br#"{"id":"tx_B","status":"error","error":"provider rejected audio"}"#, None).await.expect("accepted");

		let updated = store.get(job.id).await.unwrap().unwrap();
		assert_eq!(updated.status, JobStatus::Failed);
		assert_eq!(updated.last_error.as_deref(), Some("provider rejected audio"));
	}

	#[tokio::test]
	async fn signature_mismatch_is_rejected_when_verification_enabled() {
		let store = store().await;
		let client = TranscriptionClient::new(reqwest::Client::new(), "https://example.invalid", "key", Some("shh".to_string()));
		let ingestor = WebhookIngestor { job_store: &store, transcription_client: &client, meeting_context: &NullMeetingContext, default_language: "vi", verify_signature: true };

		let err = ingestor.handle(br#"{"id":"tx_A","status":"processing"}"#, Some("deadbeef")).await.expect_err("must reject");
		assert_eq!(err.kind(), ErrorKind::Signature);
	}
}

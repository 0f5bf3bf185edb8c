use std::sync::Arc;

use job_store::JobStore;
use pipeline_core::MeetingContext;
use transcription_client::TranscriptionClient;

/// Everything the webhook handler needs to build a `WebhookIngestor` per
/// request. Cheap to clone the pieces it's built from (`JobStore` and
/// `TranscriptionClient` are both stateless handles), so this lives behind
/// an `Arc` shared across the router rather than being cloned per request.
pub struct WebhookApiState {
	pub job_store: JobStore,
	pub transcription_client: TranscriptionClient,
	pub meeting_context: Arc<dyn MeetingContext>,
	pub default_language: String,
	pub verify_signature: bool,
}

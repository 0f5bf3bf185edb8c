use serde::{Deserialize, Serialize};

/// Status reported by the provider for a submitted transcript (spec §4.2,
/// §6). Distinct from `pipeline_types::JobStatus` — this is the remote
/// provider's vocabulary, not our local state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
	Queued,
	Processing,
	Completed,
	Error,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
	pub upload_url: String,
}

/// Options accepted by `submit` (spec §4.2).
#[derive(Debug, Clone)]
pub struct SubmitOptions {
	pub language_code: String,
	pub speaker_labels: bool,
	pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubmitRequestBody<'a> {
	audio_url: &'a str,
	speaker_labels: bool,
	language_code: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	webhook_url: Option<&'a str>,
}

impl<'a> SubmitRequestBody<'a> {
	pub(crate) fn new(audio_url: &'a str, opts: &'a SubmitOptions) -> Self {
		Self { audio_url, speaker_labels: opts.speaker_labels, language_code: &opts.language_code, webhook_url: opts.webhook_url.as_deref() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
	pub id: String,
	pub status: ProviderStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUtterance {
	pub speaker: String,
	pub start: f64,
	pub end: f64,
	pub text: String,
	#[serde(default)]
	pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetTranscriptResponse {
	pub status: ProviderStatus,
	#[serde(default)]
	pub text: Option<String>,
	#[serde(default)]
	pub language_code: Option<String>,
	#[serde(default)]
	pub confidence: Option<f64>,
	#[serde(default)]
	pub audio_duration: Option<f64>,
	#[serde(default)]
	pub utterances: Vec<ProviderUtterance>,
	#[serde(default)]
	pub words: Option<serde_json::Value>,
	#[serde(default)]
	pub chapters: Option<serde_json::Value>,
	#[serde(default)]
	pub error: Option<String>,
}

/// Inbound webhook envelope (spec §6). Either `transcript_id` or `id` must
/// be present — the decode step that enforces this lives in the ingestor
/// (component C6), not here, since absence of both is a `protocol` error
/// the webhook boundary must reject before this client is ever consulted.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
	#[serde(default)]
	pub transcript_id: Option<String>,
	#[serde(default)]
	pub id: Option<String>,
	pub status: ProviderStatus,
	#[serde(default)]
	pub error: Option<String>,
}

impl WebhookEnvelope {
	/// The provider's identifier for the transcript, whichever field carried
	/// it (spec §6: "either `transcript_id` or `id`").
	#[must_use]
	pub fn external_id(&self) -> Option<&str> {
		self.transcript_id.as_deref().or(self.id.as_deref())
	}
}

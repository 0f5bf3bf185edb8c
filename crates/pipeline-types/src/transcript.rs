use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per completed transcription (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
	pub id: uuid::Uuid,
	pub meeting_id: uuid::Uuid,
	pub recording_id: Option<uuid::Uuid>,
	pub room_id: Option<uuid::Uuid>,
	pub text: String,
	pub language: String,
	pub confidence: Option<f64>,
	pub processing_time: Option<f64>,
	pub has_speakers: bool,
	pub speaker_count: Option<i64>,
	pub model_used: Option<String>,
	/// Denormalized copy of `meeting_summaries.executive_summary` (spec §9
	/// "Transcript denormalization") — written in the same step as the
	/// summary so legacy readers of `transcripts.summary` stay current.
	pub summary: Option<String>,
	pub chapters: Option<serde_json::Value>,
	pub words: Option<serde_json::Value>,
	pub raw_data: Option<serde_json::Value>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Parameters accepted when a webhook/poller persists a freshly fetched
/// transcript (spec §4.6 step 5).
#[derive(Debug, Clone)]
pub struct NewTranscript {
	pub meeting_id: uuid::Uuid,
	pub recording_id: Option<uuid::Uuid>,
	pub room_id: Option<uuid::Uuid>,
	pub text: String,
	pub language: String,
	pub confidence: Option<f64>,
	pub processing_time: Option<f64>,
	pub speakers: Vec<NewUtterance>,
	pub model_used: Option<String>,
	pub chapters: Option<serde_json::Value>,
	pub words: Option<serde_json::Value>,
	pub raw_data: Option<serde_json::Value>,
}

/// Speaker-segmented transcript line (spec §3). Always references an
/// existing `Transcript` (invariant I4) — orphans are disallowed by
/// construction: utterances are only ever inserted alongside their parent
/// transcript row, in the same transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
	pub id: uuid::Uuid,
	pub transcript_id: uuid::Uuid,
	pub speaker: String,
	pub start: f64,
	pub end: f64,
	pub text: String,
	pub confidence: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewUtterance {
	pub speaker: String,
	pub start: f64,
	pub end: f64,
	pub text: String,
	pub confidence: Option<f64>,
}

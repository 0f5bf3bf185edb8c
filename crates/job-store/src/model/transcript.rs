use chrono::{DateTime, Utc};
use pipeline_types::{Transcript, Utterance};

use crate::error::{JobStoreError, Result};

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).map_err(|e| JobStoreError::Decode(format!("bad timestamp {s:?}: {e}")))
}

fn parse_uuid(s: &str) -> Result<uuid::Uuid> {
	uuid::Uuid::parse_str(s).map_err(|e| JobStoreError::Decode(format!("bad uuid {s:?}: {e}")))
}

fn parse_optional_uuid(s: Option<&str>) -> Result<Option<uuid::Uuid>> {
	s.map(parse_uuid).transpose()
}

fn parse_optional_json(s: Option<&str>) -> Result<Option<serde_json::Value>> {
	s.map(|s| serde_json::from_str(s).map_err(|e| JobStoreError::Decode(format!("bad json: {e}")))).transpose()
}

#[derive(Debug, sqlx::FromRow)]
pub struct TranscriptRow {
	pub id: String,
	pub meeting_id: String,
	pub recording_id: Option<String>,
	pub room_id: Option<String>,
	pub text: String,
	pub language: String,
	pub confidence: Option<f64>,
	pub processing_time: Option<f64>,
	pub has_speakers: i64,
	pub speaker_count: Option<i64>,
	pub model_used: Option<String>,
	pub summary: Option<String>,
	pub chapters: Option<String>,
	pub words: Option<String>,
	pub raw_data: Option<String>,
	pub created_at: String,
	pub updated_at: String,
}

impl TranscriptRow {
	pub fn into_transcript(self) -> Result<Transcript> {
		Ok(Transcript {
			id: parse_uuid(&self.id)?,
			meeting_id: parse_uuid(&self.meeting_id)?,
			recording_id: parse_optional_uuid(self.recording_id.as_deref())?,
			room_id: parse_optional_uuid(self.room_id.as_deref())?,
			text: self.text,
			language: self.language,
			confidence: self.confidence,
			processing_time: self.processing_time,
			has_speakers: self.has_speakers != 0,
			speaker_count: self.speaker_count,
			model_used: self.model_used,
			summary: self.summary,
			chapters: parse_optional_json(self.chapters.as_deref())?,
			words: parse_optional_json(self.words.as_deref())?,
			raw_data: parse_optional_json(self.raw_data.as_deref())?,
			created_at: parse_timestamp(&self.created_at)?,
			updated_at: parse_timestamp(&self.updated_at)?,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct UtteranceRow {
	pub id: String,
	pub transcript_id: String,
	pub speaker: String,
	pub start_sec: f64,
	pub end_sec: f64,
	pub text: String,
	pub confidence: Option<f64>,
}

impl UtteranceRow {
	pub fn into_utterance(self) -> Result<Utterance> {
		Ok(Utterance {
			id: parse_uuid(&self.id)?,
			transcript_id: parse_uuid(&self.transcript_id)?,
			speaker: self.speaker,
			start: self.start_sec,
			end: self.end_sec,
			text: self.text,
			confidence: self.confidence,
		})
	}
}

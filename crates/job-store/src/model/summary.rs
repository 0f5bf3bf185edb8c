use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pipeline_types::Summary;

use crate::error::{JobStoreError, Result};

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).map_err(|e| JobStoreError::Decode(format!("bad timestamp {s:?}: {e}")))
}

fn parse_uuid(s: &str) -> Result<uuid::Uuid> {
	uuid::Uuid::parse_str(s).map_err(|e| JobStoreError::Decode(format!("bad uuid {s:?}: {e}")))
}

fn parse_string_list(s: &str) -> Result<Vec<String>> {
	serde_json::from_str(s).map_err(|e| JobStoreError::Decode(format!("bad json array: {e}")))
}

fn parse_sentiment_breakdown(s: &str) -> Result<HashMap<String, f64>> {
	serde_json::from_str(s).map_err(|e| JobStoreError::Decode(format!("bad sentiment breakdown json: {e}")))
}

#[derive(Debug, sqlx::FromRow)]
pub struct SummaryRow {
	pub id: String,
	pub meeting_id: String,
	pub transcript_id: String,
	pub executive_summary: String,
	pub key_points: String,
	pub decisions: String,
	pub topics: String,
	pub open_questions: String,
	pub next_steps: String,
	pub overall_sentiment: Option<String>,
	pub sentiment_breakdown: String,
	pub total_speaking_time: Option<f64>,
	pub participant_balance: Option<f64>,
	pub engagement_score: Option<f64>,
	pub model_used: Option<String>,
	pub processing_time_ms: Option<i64>,
	pub created_at: String,
	pub updated_at: String,
}

impl SummaryRow {
	pub fn into_summary(self) -> Result<Summary> {
		Ok(Summary {
			id: parse_uuid(&self.id)?,
			meeting_id: parse_uuid(&self.meeting_id)?,
			transcript_id: parse_uuid(&self.transcript_id)?,
			executive_summary: self.executive_summary,
			key_points: parse_string_list(&self.key_points)?,
			decisions: parse_string_list(&self.decisions)?,
			topics: parse_string_list(&self.topics)?,
			open_questions: parse_string_list(&self.open_questions)?,
			next_steps: parse_string_list(&self.next_steps)?,
			overall_sentiment: self.overall_sentiment,
			sentiment_breakdown: parse_sentiment_breakdown(&self.sentiment_breakdown)?,
			total_speaking_time: self.total_speaking_time,
			participant_balance: self.participant_balance,
			engagement_score: self.engagement_score,
			model_used: self.model_used,
			processing_time_ms: self.processing_time_ms,
			created_at: parse_timestamp(&self.created_at)?,
			updated_at: parse_timestamp(&self.updated_at)?,
		})
	}
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed placeholder text emitted on the minimal-summary fast path
/// (spec §4.4, law L4).
pub const MINIMAL_SUMMARY_TEXT: &str = "Meeting was too short to generate detailed analysis.";

/// One row per meeting, unique on `meeting_id` (spec §3, invariant I3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
	pub id: uuid::Uuid,
	pub meeting_id: uuid::Uuid,
	pub transcript_id: uuid::Uuid,
	pub executive_summary: String,
	pub key_points: Vec<String>,
	pub decisions: Vec<String>,
	pub topics: Vec<String>,
	pub open_questions: Vec<String>,
	pub next_steps: Vec<String>,
	pub overall_sentiment: Option<String>,
	pub sentiment_breakdown: HashMap<String, f64>,
	pub total_speaking_time: Option<f64>,
	pub participant_balance: Option<f64>,
	pub engagement_score: Option<f64>,
	pub model_used: Option<String>,
	pub processing_time_ms: Option<i64>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Parameters for `JobStore::upsert_summary` — upserts on `meeting_id`
/// (invariant I3: a second successful run upserts rather than duplicating).
#[derive(Debug, Clone)]
pub struct NewSummary {
	pub meeting_id: uuid::Uuid,
	pub transcript_id: uuid::Uuid,
	pub executive_summary: String,
	pub key_points: Vec<String>,
	pub decisions: Vec<String>,
	pub topics: Vec<String>,
	pub open_questions: Vec<String>,
	pub next_steps: Vec<String>,
	pub overall_sentiment: Option<String>,
	pub sentiment_breakdown: HashMap<String, f64>,
	pub total_speaking_time: Option<f64>,
	pub participant_balance: Option<f64>,
	pub engagement_score: Option<f64>,
	pub model_used: Option<String>,
	pub processing_time_ms: Option<i64>,
}

impl NewSummary {
	/// The placeholder Summary emitted when the transcript is too short to
	/// justify an LLM call (spec §4.4, law L4, scenario S5).
	#[must_use]
	pub fn minimal(meeting_id: uuid::Uuid, transcript_id: uuid::Uuid) -> Self {
		Self {
			meeting_id,
			transcript_id,
			executive_summary: MINIMAL_SUMMARY_TEXT.to_string(),
			key_points: Vec::new(),
			decisions: Vec::new(),
			topics: Vec::new(),
			open_questions: Vec::new(),
			next_steps: Vec::new(),
			overall_sentiment: None,
			sentiment_breakdown: HashMap::new(),
			total_speaking_time: None,
			participant_balance: None,
			engagement_score: None,
			model_used: None,
			processing_time_ms: None,
		}
	}
}

use std::collections::HashMap;

use pipeline_types::ActionItemPriority;
use serde::Deserialize;

fn default_priority() -> ActionItemPriority {
	ActionItemPriority::Medium
}

/// A decision recorded in the meeting.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDecision {
	pub text: String,
	#[serde(default)]
	pub owner: Option<String>,
	#[serde(default)]
	pub impact: Option<String>,
	#[serde(default)]
	pub timestamp: Option<f64>,
}

/// A next step recorded in the meeting.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNextStep {
	pub text: String,
	#[serde(default)]
	pub owner: Option<String>,
	#[serde(default)]
	pub due_date: Option<String>,
	#[serde(default = "default_priority")]
	pub priority: ActionItemPriority,
}

/// An action item as the LLM reports it, before it is assigned a
/// `pending` status and carried into `pipeline_types::NewActionItem`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawActionItem {
	pub title: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(rename = "type", default)]
	pub item_type: Option<String>,
	#[serde(default = "default_priority")]
	pub priority: ActionItemPriority,
	#[serde(default)]
	pub transcript_reference: Option<String>,
	#[serde(default)]
	pub timestamp: Option<f64>,
}

/// Structural decode of the LLM's JSON document. Every field but
/// `executive_summary` is optional: the LLM's output is untrusted, so
/// empty arrays/maps are accepted and only a missing or empty
/// `executive_summary` is rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResult {
	pub executive_summary: String,
	#[serde(default)]
	pub key_points: Vec<String>,
	#[serde(default)]
	pub decisions: Vec<RawDecision>,
	#[serde(default)]
	pub topics: Vec<String>,
	#[serde(default)]
	pub open_questions: Vec<String>,
	#[serde(default)]
	pub next_steps: Vec<RawNextStep>,
	#[serde(default)]
	pub action_items: Vec<RawActionItem>,
	#[serde(default)]
	pub overall_sentiment: Option<String>,
	#[serde(default)]
	pub sentiment_breakdown: HashMap<String, f64>,
	#[serde(default)]
	pub total_speaking_time: Option<f64>,
	#[serde(default)]
	pub participant_balance: Option<f64>,
	#[serde(default)]
	pub engagement_score: Option<f64>,
}

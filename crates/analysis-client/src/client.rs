use serde::{Deserialize, Serialize};

use crate::error::{AnalysisClientError, Result};

const SYSTEM_PROMPT: &str = r#"You are a meeting analyst. Given a meeting transcript, respond with a single JSON document and nothing else (no markdown fences, no commentary) with this shape:
{
  "executive_summary": string,
  "key_points": string[],
  "decisions": [{"text": string, "owner": string|null, "impact": string|null, "timestamp": number|null}],
  "topics": string[],
  "open_questions": string[],
  "next_steps": [{"text": string, "owner": string|null, "due_date": string|null, "priority": "low"|"medium"|"high"|"urgent"}],
  "action_items": [{"title": string, "description": string|null, "type": "action"|"question"|"research", "priority": "low"|"medium"|"high"|"urgent", "transcript_reference": string|null, "timestamp": number|null}],
  "overall_sentiment": string|null,
  "sentiment_breakdown": {string: number},
  "total_speaking_time": number|null,
  "participant_balance": number|null,
  "engagement_score": number|null
}
`executive_summary` is required; every other field may be an empty array/object if nothing applies."#;

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
	role: &'a str,
	content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
	model: &'a str,
	messages: Vec<ChatMessage<'a>>,
	temperature: f64,
	max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
	choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
	message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
	content: String,
}

/// Wraps the external LLM provider (component C3). A single operation:
/// hand it a transcript, get back raw assistant text. Parsing that text
/// into a structured result is `analysis-parser`'s job (component C4), not
/// this crate's — the client's contract ends at "valid chat completion."
#[derive(Clone)]
pub struct AnalysisClient {
	http: reqwest::Client,
	base_url: String,
	api_key: String,
	model: String,
	temperature: f64,
	max_tokens: u32,
}

impl AnalysisClient {
	#[must_use]
	pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>, temperature: f64, max_tokens: u32) -> Self {
		Self { http, base_url: base_url.into(), api_key: api_key.into(), model: model.into(), temperature, max_tokens }
	}

	async fn classify_error(resp: reqwest::Response) -> AnalysisClientError {
		let status = resp.status();
		let body = resp.text().await.unwrap_or_default();
		if status.is_server_error() {
			AnalysisClientError::Provider5xx { status: status.as_u16(), body }
		} else {
			AnalysisClientError::Provider4xx { status: status.as_u16(), body }
		}
	}

	/// Generates structured analysis from a transcript (spec §4.3). Returns
	/// the raw assistant content — untrusted, possibly fenced, possibly
	/// missing optional fields — for `analysis-parser` to validate.
	#[tracing::instrument(skip(self, transcript), fields(model = %self.model, language))]
	pub async fn generate_structured_analysis(&self, transcript: &str, language: &str) -> Result<String> {
		let user_prompt = format!("Meeting language: {language}\n\nTranscript:\n{transcript}");

		let body = ChatCompletionRequest {
			model: &self.model,
			messages: vec![ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() }, ChatMessage { role: "user", content: user_prompt }],
			temperature: self.temperature,
			max_tokens: self.max_tokens,
		};

		let resp = self
			.http
			.post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
			.bearer_auth(&self.api_key)
			.json(&body)
			.send()
			.await?;

		if !resp.status().is_success() {
			return Err(Self::classify_error(resp).await);
		}

		let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| AnalysisClientError::Protocol(e.to_string()))?;
		parsed.choices.into_iter().next().map(|c| c.message.content).ok_or_else(|| AnalysisClientError::Protocol("empty choices array".to_string()))
	}
}

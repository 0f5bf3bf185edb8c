use crate::error::{ParserError, Result};
use crate::model::AnalysisResult;

/// Strips a markdown code fence if the LLM wrapped its JSON in one.
/// Tolerates a language tag (```json) and trailing prose after the
/// closing fence — only the fenced body, or the whole trimmed string if
/// there's no fence, is returned.
#[must_use]
pub fn extract_json(raw: &str) -> &str {
	let trimmed = raw.trim();
	let Some(after_open) = trimmed.strip_prefix("```") else {
		return trimmed;
	};

	// Skip an optional language tag on the fence's opening line (e.g. "json").
	let body_start = after_open.find('\n').map_or(after_open, |idx| &after_open[idx + 1..]);

	body_start.find("```").map_or_else(|| body_start.trim(), |end| body_start[..end].trim())
}

/// Decodes the LLM's JSON document. Tolerant of markdown fences and
/// missing optional fields; rejects only on a missing or unparseable
/// `executive_summary`.
pub fn parse(raw: &str) -> Result<AnalysisResult> {
	let json_body = extract_json(raw);
	let result: AnalysisResult = serde_json::from_str(json_body)?;

	if result.executive_summary.trim().is_empty() {
		return Err(ParserError::MissingExecutiveSummary);
	}

	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extract_json_passes_through_unfenced_body() {
		assert_eq!(extract_json(r#"{"a":1}"#), r#"{"a":1}"#);
	}

	#[test]
	fn extract_json_strips_fence_with_language_tag() {
		let fenced = "```json\n{\"a\":1}\n```";
		assert_eq!(extract_json(fenced), r#"{"a":1}"#);
	}

	#[test]
	fn extract_json_strips_bare_fence() {
		let fenced = "```\n{\"a\":1}\n```";
		assert_eq!(extract_json(fenced), r#"{"a":1}"#);
	}

	#[test]
	fn parse_accepts_fenced_identically_to_unfenced() {
		let unfenced = r#"{"executive_summary":"X"}"#;
		let fenced = format!("```json\n{unfenced}\n```");

		let a = parse(unfenced).expect("unfenced parses");
		let b = parse(&fenced).expect("fenced parses");
		assert_eq!(a.executive_summary, b.executive_summary);
	}

	#[test]
	fn parse_accepts_empty_collections() {
		let result = parse(r#"{"executive_summary":"X"}"#).expect("parses");
		assert!(result.key_points.is_empty());
		assert!(result.decisions.is_empty());
		assert!(result.sentiment_breakdown.is_empty());
	}

	#[test]
	fn parse_rejects_missing_executive_summary() {
		let err = parse(r#"{"key_points":[]}"#).expect_err("must fail");
		assert!(matches!(err, ParserError::InvalidJson(_)));
	}

	#[test]
	fn parse_rejects_empty_executive_summary() {
		let err = parse(r#"{"executive_summary":""}"#).expect_err("must fail");
		assert!(matches!(err, ParserError::MissingExecutiveSummary));
	}

	#[test]
	fn parse_rejects_non_json_prose() {
		let err = parse("I cannot help with that.").expect_err("must fail");
		assert!(matches!(err, ParserError::InvalidJson(_)));
	}
}

use pipeline_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
	#[error("LLM response was not valid JSON: {0}")]
	InvalidJson(#[from] serde_json::Error),

	#[error("LLM response is missing the required `executive_summary` field")]
	MissingExecutiveSummary,
}

impl ParserError {
	/// Both variants are the `parse` kind: the caller retries once, then
	/// fails the job.
	#[must_use]
	pub const fn kind(&self) -> ErrorKind {
		ErrorKind::Parse
	}
}

pub type Result<T> = std::result::Result<T, ParserError>;

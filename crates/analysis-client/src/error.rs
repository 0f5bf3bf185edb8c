use pipeline_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisClientError {
	#[error("network error talking to LLM provider: {0}")]
	Network(#[from] reqwest::Error),

	#[error("LLM provider returned {status}: {body}")]
	Provider5xx { status: u16, body: String },

	#[error("LLM provider rejected request ({status}): {body}")]
	Provider4xx { status: u16, body: String },

	#[error("malformed response from LLM provider: {0}")]
	Protocol(String),
}

impl AnalysisClientError {
	#[must_use]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::Network(_) | Self::Provider5xx { .. } => ErrorKind::TransientNetwork,
			Self::Provider4xx { .. } => ErrorKind::Provider4xx,
			Self::Protocol(_) => ErrorKind::Protocol,
		}
	}
}

pub type Result<T> = std::result::Result<T, AnalysisClientError>;

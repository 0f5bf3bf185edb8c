use pipeline_types::ErrorKind;
use thiserror::Error;

/// Failure modes talking to the external speech-to-text provider (spec
/// §4.2, §7). Transient network failures and provider 5xx are distinguished
/// from permanent 4xx so the caller's retry policy can dispatch on `kind()`
/// without downcasting.
#[derive(Debug, Error)]
pub enum TranscriptionClientError {
	#[error("network error talking to transcription provider: {0}")]
	Network(#[from] reqwest::Error),

	#[error("transcription provider returned {status}: {body}")]
	Provider5xx { status: u16, body: String },

	#[error("transcription provider rejected request ({status}): {body}")]
	Provider4xx { status: u16, body: String },

	#[error("malformed response from transcription provider: {0}")]
	Protocol(String),
}

impl TranscriptionClientError {
	#[must_use]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::Network(_) | Self::Provider5xx { .. } => ErrorKind::TransientNetwork,
			Self::Provider4xx { .. } => ErrorKind::Provider4xx,
			Self::Protocol(_) => ErrorKind::Protocol,
		}
	}
}

pub type Result<T> = std::result::Result<T, TranscriptionClientError>;

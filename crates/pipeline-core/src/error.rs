use pipeline_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineCoreError {
	#[error("job store error: {0}")]
	JobStore(#[from] job_store::JobStoreError),

	#[error("pool supervisor is already running")]
	AlreadyRunning,
}

impl PipelineCoreError {
	#[must_use]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::JobStore(_) => ErrorKind::TransientNetwork,
			Self::AlreadyRunning => ErrorKind::State,
		}
	}
}

pub type Result<T> = std::result::Result<T, PipelineCoreError>;

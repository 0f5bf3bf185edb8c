use pipeline_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobStoreError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),

	#[error("corrupt row: {0}")]
	Decode(String),

	#[error("job {0} not found")]
	NotFound(uuid::Uuid),
}

impl JobStoreError {
	#[must_use]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::Database(_) | Self::Migrate(_) => ErrorKind::TransientNetwork,
			Self::Decode(_) | Self::NotFound(_) => ErrorKind::Protocol,
		}
	}
}

pub type Result<T> = std::result::Result<T, JobStoreError>;

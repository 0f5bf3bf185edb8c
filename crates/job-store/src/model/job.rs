use std::str::FromStr;

use chrono::{DateTime, Utc};
use pipeline_types::job::JobMetadata;
use pipeline_types::{Job, JobStatus, JobType};

use crate::error::{JobStoreError, Result};

/// Raw row shape as it comes back from SQLite. Kept separate from
/// `pipeline_types::Job` because every non-primitive column (status, type,
/// ids, metadata) needs a fallible conversion on the way out.
#[derive(Debug, sqlx::FromRow)]
pub struct JobRow {
	pub id: String,
	pub meeting_id: String,
	pub job_type: String,
	pub recording_url: String,
	pub status: String,
	pub external_job_id: Option<String>,
	pub transcript_id: Option<String>,
	pub started_at: Option<String>,
	pub completed_at: Option<String>,
	pub updated_at: String,
	pub created_at: String,
	pub retry_count: i64,
	pub max_retries: i64,
	pub last_error: Option<String>,
	pub metadata: String,
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).map_err(|e| JobStoreError::Decode(format!("bad timestamp {s:?}: {e}")))
}

fn parse_optional_timestamp(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
	s.map(parse_timestamp).transpose()
}

fn parse_uuid(s: &str) -> Result<uuid::Uuid> {
	uuid::Uuid::parse_str(s).map_err(|e| JobStoreError::Decode(format!("bad uuid {s:?}: {e}")))
}

fn parse_optional_uuid(s: Option<&str>) -> Result<Option<uuid::Uuid>> {
	s.map(parse_uuid).transpose()
}

impl JobRow {
	pub fn into_job(self) -> Result<Job> {
		let status = JobStatus::from_str(&self.status).map_err(|e| JobStoreError::Decode(e.to_string()))?;
		let job_type = JobType::from_str(&self.job_type).map_err(|e| JobStoreError::Decode(e.to_string()))?;
		let metadata: JobMetadata = serde_json::from_str(&self.metadata).map_err(|e| JobStoreError::Decode(format!("bad metadata json: {e}")))?;

		Ok(Job {
			id: parse_uuid(&self.id)?,
			meeting_id: parse_uuid(&self.meeting_id)?,
			job_type,
			recording_url: self.recording_url,
			status,
			external_job_id: self.external_job_id,
			transcript_id: parse_optional_uuid(self.transcript_id.as_deref())?,
			started_at: parse_optional_timestamp(self.started_at.as_deref())?,
			completed_at: parse_optional_timestamp(self.completed_at.as_deref())?,
			updated_at: parse_timestamp(&self.updated_at)?,
			created_at: parse_timestamp(&self.created_at)?,
			retry_count: i32::try_from(self.retry_count).unwrap_or(i32::MAX),
			max_retries: i32::try_from(self.max_retries).unwrap_or(i32::MAX),
			last_error: self.last_error,
			metadata,
		})
	}
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job state machine (spec §4.1). Transitions are driven exclusively by
/// `job-store`'s atomic conditional updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Pending,
	Submitted,
	Processing,
	TranscriptReady,
	Summarizing,
	Completed,
	Failed,
	Retrying,
	Cancelled,
}

impl JobStatus {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Submitted => "submitted",
			Self::Processing => "processing",
			Self::TranscriptReady => "transcript_ready",
			Self::Summarizing => "summarizing",
			Self::Completed => "completed",
			Self::Failed => "failed",
			Self::Retrying => "retrying",
			Self::Cancelled => "cancelled",
		}
	}

	/// Statuses that imply `external_job_id` must be set (invariant I1).
	#[must_use]
	pub const fn requires_external_id(self) -> bool {
		matches!(self, Self::Submitted | Self::Processing | Self::TranscriptReady | Self::Summarizing | Self::Completed)
	}
}

impl fmt::Display for JobStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized job status: {0}")]
pub struct ParseJobStatusError(String);

impl FromStr for JobStatus {
	type Err = ParseJobStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(Self::Pending),
			"submitted" => Ok(Self::Submitted),
			"processing" => Ok(Self::Processing),
			"transcript_ready" => Ok(Self::TranscriptReady),
			"summarizing" => Ok(Self::Summarizing),
			"completed" => Ok(Self::Completed),
			"failed" => Ok(Self::Failed),
			"retrying" => Ok(Self::Retrying),
			"cancelled" => Ok(Self::Cancelled),
			other => Err(ParseJobStatusError(other.to_string())),
		}
	}
}

/// Open Question resolution (SPEC_FULL §4): only `Transcription` jobs drive
/// real work; the other variants are accepted by the schema but otherwise
/// inert until a future caller produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
	Transcription,
	Analysis,
	Report,
}

impl JobType {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Transcription => "transcription",
			Self::Analysis => "analysis",
			Self::Report => "report",
		}
	}
}

impl fmt::Display for JobType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized job type: {0}")]
pub struct ParseJobTypeError(String);

impl FromStr for JobType {
	type Err = ParseJobTypeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"transcription" => Ok(Self::Transcription),
			"analysis" => Ok(Self::Analysis),
			"report" => Ok(Self::Report),
			other => Err(ParseJobTypeError(other.to_string())),
		}
	}
}

/// Free-form job metadata (spec §3). Kept as a loosely-typed bag because
/// `webhook_attempts` and ad-hoc error details accrete over a job's life
/// and don't warrant a migration each time a new field shows up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
	pub duration_seconds: Option<f64>,
	pub language: Option<String>,
	pub speaker_count: Option<i64>,
	pub processing_time_ms: Option<i64>,
	#[serde(default)]
	pub webhook_attempts: i64,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One row per transcription+analysis attempt for a meeting (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
	pub id: uuid::Uuid,
	pub meeting_id: uuid::Uuid,
	pub job_type: JobType,
	pub recording_url: String,
	pub status: JobStatus,
	pub external_job_id: Option<String>,
	pub transcript_id: Option<uuid::Uuid>,
	pub started_at: Option<DateTime<Utc>>,
	pub completed_at: Option<DateTime<Utc>>,
	pub updated_at: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
	pub retry_count: i32,
	pub max_retries: i32,
	pub last_error: Option<String>,
	pub metadata: JobMetadata,
}

impl Job {
	/// Invariant I2: `retry_count <= max_retries` at all times.
	#[must_use]
	pub const fn retries_exhausted(&self) -> bool {
		self.retry_count >= self.max_retries
	}
}

/// Parameters accepted by `JobStore::create`.
#[derive(Debug, Clone)]
pub struct NewJob {
	pub meeting_id: uuid::Uuid,
	pub job_type: JobType,
	pub recording_url: String,
	pub max_retries: i32,
}

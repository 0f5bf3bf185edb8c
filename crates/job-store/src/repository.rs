use chrono::{DateTime, Utc};
use pipeline_types::job::NewJob;
use pipeline_types::summary::NewSummary;
use pipeline_types::transcript::NewTranscript;
use pipeline_types::{ActionItem, Job, JobStatus, NewActionItem, Summary, Transcript, Utterance};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::queries;

/// Owns the pool and exposes the job/transcript/summary/action-item
/// operations every pipeline worker claims, submits, and resolves jobs
/// through. All transitions funnel through here so the atomic-claim
/// guarantees live in one place.
#[derive(Clone)]
pub struct JobStore {
	pool: SqlitePool,
}

impl JobStore {
	#[must_use]
	pub const fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[must_use]
	pub const fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Runs the embedded migrations. Idempotent: safe to call on every
	/// startup, including against a database already at the latest version.
	pub async fn run_migrations(&self) -> Result<()> {
		sqlx::migrate!("./migrations").run(&self.pool).await?;
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(meeting_id = %new.meeting_id, job_type = %new.job_type))]
	pub async fn create(&self, new: NewJob) -> Result<Job> {
		let row = queries::insert_job(&self.pool, new).await?;
		row.into_job()
	}

	pub async fn get(&self, id: uuid::Uuid) -> Result<Option<Job>> {
		queries::fetch_job_row(&self.pool, id).await?.map(super::model::JobRow::into_job).transpose()
	}

	/// Atomically claims up to `limit` pending jobs for the submission
	/// worker, flipping each straight to `submitted` (spec §4.1).
	/// `external_job_id` is still null on the returned rows until
	/// `mark_submitted` attaches it — a crash in between is recoverable by
	/// the webhook-timeout poller rather than stranding the row in
	/// `pending` where nothing reclaims it.
	#[tracing::instrument(skip(self))]
	pub async fn claim_pending(&self, limit: i64) -> Result<Vec<Job>> {
		let rows = queries::claim_pending(&self.pool, limit).await?;
		rows.into_iter().map(super::model::JobRow::into_job).collect()
	}

	#[tracing::instrument(skip(self), fields(job_id = %id))]
	pub async fn mark_submitted(&self, id: uuid::Uuid, external_job_id: &str) -> Result<Option<Job>> {
		queries::mark_submitted(&self.pool, id, external_job_id).await?.map(super::model::JobRow::into_job).transpose()
	}

	/// Atomically moves a `transcript_ready` job into `summarizing`. Returns
	/// `Ok(None)` if another summary worker already won the claim.
	#[tracing::instrument(skip(self), fields(job_id = %id))]
	pub async fn claim_transcript_ready(&self, id: uuid::Uuid) -> Result<Option<Job>> {
		queries::cas_status(&self.pool, id, JobStatus::TranscriptReady, JobStatus::Summarizing).await?.map(super::model::JobRow::into_job).transpose()
	}

	#[tracing::instrument(skip(self), fields(job_id = %id, transcript_id = %transcript_id))]
	pub async fn mark_transcript_ready(&self, id: uuid::Uuid, transcript_id: uuid::Uuid) -> Result<Option<Job>> {
		queries::mark_transcript_ready(&self.pool, id, transcript_id).await?.map(super::model::JobRow::into_job).transpose()
	}

	#[tracing::instrument(skip(self), fields(job_id = %id))]
	pub async fn mark_completed(&self, id: uuid::Uuid) -> Result<Option<Job>> {
		queries::mark_completed(&self.pool, id).await?.map(super::model::JobRow::into_job).transpose()
	}

	#[tracing::instrument(skip(self, err), fields(job_id = %id))]
	pub async fn mark_failed(&self, id: uuid::Uuid, err: &str) -> Result<Option<Job>> {
		queries::mark_failed(&self.pool, id, err).await?.map(super::model::JobRow::into_job).transpose()
	}

	/// Routes a failed step back to `retry_target` (`Pending` for
	/// submission failures, `TranscriptReady` for summarization failures)
	/// or to `Failed` once retries are exhausted.
	#[tracing::instrument(skip(self, err), fields(job_id = %id, retry_target = %retry_target))]
	pub async fn increment_retry(&self, id: uuid::Uuid, err: &str, retry_target: JobStatus) -> Result<Option<Job>> {
		queries::increment_retry(&self.pool, id, err, retry_target).await?.map(super::model::JobRow::into_job).transpose()
	}

	/// Unconditional status transition. Only call this when the caller
	/// already holds an exclusive claim on `id`.
	#[tracing::instrument(skip(self), fields(job_id = %id, new_status = %new))]
	pub async fn update_status(&self, id: uuid::Uuid, new: JobStatus) -> Result<Option<Job>> {
		queries::update_status(&self.pool, id, new).await?.map(super::model::JobRow::into_job).transpose()
	}

	pub async fn heartbeat(&self, id: uuid::Uuid) -> Result<()> {
		queries::heartbeat(&self.pool, id).await
	}

	pub async fn find_by_external_id(&self, external_job_id: &str) -> Result<Option<Job>> {
		queries::find_by_external_id(&self.pool, external_job_id).await?.map(super::model::JobRow::into_job).transpose()
	}

	pub async fn find_by_status(&self, status: JobStatus, limit: i64) -> Result<Vec<Job>> {
		queries::find_by_status(&self.pool, status, limit).await?.into_iter().map(super::model::JobRow::into_job).collect()
	}

	/// Finds jobs stuck in `status` since before `older_than`, for the
	/// reconciliation workers.
	pub async fn find_stuck(&self, status: JobStatus, older_than: DateTime<Utc>) -> Result<Vec<Job>> {
		queries::find_stuck(&self.pool, status, older_than).await?.into_iter().map(super::model::JobRow::into_job).collect()
	}

	pub async fn list_processable(&self, limit: i64) -> Result<Vec<Job>> {
		queries::list_processable(&self.pool, limit).await?.into_iter().map(super::model::JobRow::into_job).collect()
	}

	pub async fn find_by_meeting(&self, meeting_id: uuid::Uuid) -> Result<Vec<Job>> {
		queries::find_by_meeting(&self.pool, meeting_id).await?.into_iter().map(super::model::JobRow::into_job).collect()
	}

	/// Upserts the transcript and its utterances for a meeting: a second
	/// successful fetch replaces the row rather than duplicating it.
	#[tracing::instrument(skip(self, new), fields(meeting_id = %new.meeting_id))]
	pub async fn upsert_transcript(&self, new: NewTranscript) -> Result<(Transcript, Vec<Utterance>)> {
		let (row, utterance_rows) = queries::upsert_transcript(&self.pool, new).await?;
		let transcript = row.into_transcript()?;
		let utterances = utterance_rows.into_iter().map(super::model::UtteranceRow::into_utterance).collect::<Result<Vec<_>>>()?;
		Ok((transcript, utterances))
	}

	pub async fn get_transcript_by_meeting(&self, meeting_id: uuid::Uuid) -> Result<Option<Transcript>> {
		queries::get_transcript_by_meeting(&self.pool, meeting_id).await?.map(super::model::TranscriptRow::into_transcript).transpose()
	}

	pub async fn get_utterances(&self, transcript_id: uuid::Uuid) -> Result<Vec<Utterance>> {
		queries::get_utterances(&self.pool, transcript_id).await?.into_iter().map(super::model::UtteranceRow::into_utterance).collect()
	}

	pub async fn update_transcript_summary_field(&self, meeting_id: uuid::Uuid, summary_text: &str) -> Result<()> {
		queries::update_transcript_summary_field(&self.pool, meeting_id, summary_text).await
	}

	#[tracing::instrument(skip(self, new), fields(meeting_id = %new.meeting_id))]
	pub async fn upsert_summary(&self, new: NewSummary) -> Result<Summary> {
		queries::upsert_summary(&self.pool, new).await?.into_summary()
	}

	pub async fn insert_action_items(&self, items: Vec<NewActionItem>) -> Result<Vec<ActionItem>> {
		queries::insert_action_items(&self.pool, items).await?.into_iter().map(super::model::ActionItemRow::into_action_item).collect()
	}

	pub async fn get_action_items_by_summary(&self, summary_id: uuid::Uuid) -> Result<Vec<ActionItem>> {
		queries::get_action_items_by_summary(&self.pool, summary_id).await?.into_iter().map(super::model::ActionItemRow::into_action_item).collect()
	}
}

use chrono::{DateTime, Utc};
use pipeline_types::job::{JobMetadata, NewJob};
use pipeline_types::summary::NewSummary;
use pipeline_types::transcript::NewTranscript;
use pipeline_types::{JobStatus, NewActionItem};
use sqlx::SqlitePool;

use crate::error::{JobStoreError, Result};
use crate::model::{ActionItemRow, JobRow, SummaryRow, TranscriptRow, UtteranceRow};

fn now() -> DateTime<Utc> {
	Utc::now()
}

pub async fn insert_job(pool: &SqlitePool, new: NewJob) -> Result<JobRow> {
	let id = uuid::Uuid::new_v4();
	let now = now();
	let metadata = serde_json::to_string(&JobMetadata::default()).map_err(|e| JobStoreError::Decode(e.to_string()))?;

	sqlx::query(
		r#"
		INSERT INTO ai_jobs (id, meeting_id, job_type, recording_url, status, retry_count, max_retries, metadata, updated_at, created_at)
		VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
		"#,
	)
	.bind(id.to_string())
	.bind(new.meeting_id.to_string())
	.bind(new.job_type.as_str())
	.bind(&new.recording_url)
	.bind(JobStatus::Pending.as_str())
	.bind(i64::from(new.max_retries))
	.bind(&metadata)
	.bind(now.to_rfc3339())
	.bind(now.to_rfc3339())
	.execute(pool)
	.await?;

	fetch_job_row(pool, id).await?.ok_or(JobStoreError::NotFound(id))
}

pub async fn fetch_job_row(pool: &SqlitePool, id: uuid::Uuid) -> Result<Option<JobRow>> {
	sqlx::query_as::<_, JobRow>("SELECT * FROM ai_jobs WHERE id = ?").bind(id.to_string()).fetch_optional(pool).await.map_err(JobStoreError::from)
}

/// Flips up to `limit` `pending` rows straight to `submitted` (spec §4.1:
/// "`claim_pending(limit)` → returns jobs flipped `pending → submitted`").
/// `external_job_id` stays null until `mark_submitted` attaches it — the
/// degenerate "submitted, no external id yet" state invariant I1 carves out
/// explicitly so a crash between claim and `mark_submitted` leaves a row the
/// webhook-timeout poller (C8) can still find and reconcile, rather than one
/// stuck forever in `pending` where nothing ever looks for it again.
pub async fn claim_pending(pool: &SqlitePool, limit: i64) -> Result<Vec<JobRow>> {
	let claimed_at = now().to_rfc3339();

	let mut tx = pool.begin().await?;

	let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM ai_jobs WHERE status = ? ORDER BY created_at ASC LIMIT ?")
		.bind(JobStatus::Pending.as_str())
		.bind(limit)
		.fetch_all(&mut *tx)
		.await?;

	if ids.is_empty() {
		tx.commit().await?;
		return Ok(Vec::new());
	}

	for id in &ids {
		sqlx::query("UPDATE ai_jobs SET status = ?, started_at = ?, updated_at = ? WHERE id = ? AND status = ?")
			.bind(JobStatus::Submitted.as_str())
			.bind(&claimed_at)
			.bind(&claimed_at)
			.bind(id)
			.bind(JobStatus::Pending.as_str())
			.execute(&mut *tx)
			.await?;
	}

	let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
	let sql = format!("SELECT * FROM ai_jobs WHERE id IN ({placeholders}) AND status = ? AND started_at = ?");
	let mut query = sqlx::query_as::<_, JobRow>(&sql);
	for id in &ids {
		query = query.bind(id);
	}
	query = query.bind(JobStatus::Submitted.as_str());
	query = query.bind(&claimed_at);
	let rows = query.fetch_all(&mut *tx).await?;

	tx.commit().await?;
	Ok(rows)
}

/// Attaches the provider's external id to a row `claim_pending` already
/// moved to `submitted`. Status doesn't change here — only the id and
/// `updated_at` do — since the claim itself is what performed the
/// `pending → submitted` transition.
pub async fn mark_submitted(pool: &SqlitePool, id: uuid::Uuid, external_job_id: &str) -> Result<Option<JobRow>> {
	let ts = now().to_rfc3339();
	let rows = sqlx::query("UPDATE ai_jobs SET external_job_id = ?, updated_at = ? WHERE id = ? AND status = ?")
		.bind(external_job_id)
		.bind(&ts)
		.bind(id.to_string())
		.bind(JobStatus::Submitted.as_str())
		.execute(pool)
		.await?
		.rows_affected();

	if rows == 0 {
		return Ok(None);
	}
	fetch_job_row(pool, id).await
}

/// Atomic compare-and-swap transition. Returns `None` if the row's current
/// status no longer matches `from` (another worker already moved it).
pub async fn cas_status(pool: &SqlitePool, id: uuid::Uuid, from: JobStatus, to: JobStatus) -> Result<Option<JobRow>> {
	let ts = now().to_rfc3339();
	let rows = sqlx::query("UPDATE ai_jobs SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
		.bind(to.as_str())
		.bind(&ts)
		.bind(id.to_string())
		.bind(from.as_str())
		.execute(pool)
		.await?
		.rows_affected();

	if rows == 0 {
		return Ok(None);
	}
	fetch_job_row(pool, id).await
}

pub async fn mark_transcript_ready(pool: &SqlitePool, id: uuid::Uuid, transcript_id: uuid::Uuid) -> Result<Option<JobRow>> {
	let ts = now().to_rfc3339();
	let rows = sqlx::query("UPDATE ai_jobs SET status = ?, transcript_id = ?, updated_at = ? WHERE id = ? AND status IN (?, ?)")
		.bind(JobStatus::TranscriptReady.as_str())
		.bind(transcript_id.to_string())
		.bind(&ts)
		.bind(id.to_string())
		.bind(JobStatus::Submitted.as_str())
		.bind(JobStatus::Processing.as_str())
		.execute(pool)
		.await?
		.rows_affected();

	if rows == 0 {
		return Ok(None);
	}
	fetch_job_row(pool, id).await
}

pub async fn mark_completed(pool: &SqlitePool, id: uuid::Uuid) -> Result<Option<JobRow>> {
	let ts = now().to_rfc3339();
	let rows = sqlx::query("UPDATE ai_jobs SET status = ?, completed_at = ?, updated_at = ? WHERE id = ? AND status = ?")
		.bind(JobStatus::Completed.as_str())
		.bind(&ts)
		.bind(&ts)
		.bind(id.to_string())
		.bind(JobStatus::Summarizing.as_str())
		.execute(pool)
		.await?
		.rows_affected();

	if rows == 0 {
		return Ok(None);
	}
	fetch_job_row(pool, id).await
}

pub async fn mark_failed(pool: &SqlitePool, id: uuid::Uuid, err: &str) -> Result<Option<JobRow>> {
	let ts = now().to_rfc3339();
	let rows = sqlx::query("UPDATE ai_jobs SET status = ?, last_error = ?, completed_at = ?, updated_at = ? WHERE id = ?")
		.bind(JobStatus::Failed.as_str())
		.bind(err)
		.bind(&ts)
		.bind(&ts)
		.bind(id.to_string())
		.execute(pool)
		.await?
		.rows_affected();

	if rows == 0 {
		return Ok(None);
	}
	fetch_job_row(pool, id).await
}

/// Either routes the job back to `retry_target` with an incremented
/// `retry_count`, or to `Failed` once `retry_count >= max_retries`.
pub async fn increment_retry(pool: &SqlitePool, id: uuid::Uuid, err: &str, retry_target: JobStatus) -> Result<Option<JobRow>> {
	let Some(current) = fetch_job_row(pool, id).await? else {
		return Ok(None);
	};

	if current.retry_count >= current.max_retries {
		return mark_failed(pool, id, err).await;
	}

	let ts = now().to_rfc3339();
	let rows = sqlx::query("UPDATE ai_jobs SET status = ?, retry_count = retry_count + 1, last_error = ?, updated_at = ? WHERE id = ?")
		.bind(JobStatus::Retrying.as_str())
		.bind(err)
		.bind(&ts)
		.bind(id.to_string())
		.execute(pool)
		.await?
		.rows_affected();

	if rows == 0 {
		return Ok(None);
	}

	// Retrying is a transient marker; immediately hand the row back to the
	// worker's entry status so the next poll picks it up again.
	let rows = sqlx::query("UPDATE ai_jobs SET status = ?, started_at = NULL, updated_at = ? WHERE id = ? AND status = ?")
		.bind(retry_target.as_str())
		.bind(&ts)
		.bind(id.to_string())
		.bind(JobStatus::Retrying.as_str())
		.execute(pool)
		.await?
		.rows_affected();

	if rows == 0 {
		return Ok(None);
	}
	fetch_job_row(pool, id).await
}

/// Unconditional status transition (spec §4.1): used only when the caller
/// already holds a claim on the row (e.g. the webhook ingestor moving a
/// job it just looked up by `external_job_id` into `processing`, or the
/// zombie reconciler resetting a `summarizing` job it already found stuck).
pub async fn update_status(pool: &SqlitePool, id: uuid::Uuid, new_status: JobStatus) -> Result<Option<JobRow>> {
	let ts = now().to_rfc3339();
	let rows = sqlx::query("UPDATE ai_jobs SET status = ?, updated_at = ? WHERE id = ?").bind(new_status.as_str()).bind(&ts).bind(id.to_string()).execute(pool).await?.rows_affected();

	if rows == 0 {
		return Ok(None);
	}
	fetch_job_row(pool, id).await
}

pub async fn heartbeat(pool: &SqlitePool, id: uuid::Uuid) -> Result<()> {
	sqlx::query("UPDATE ai_jobs SET updated_at = ? WHERE id = ?").bind(now().to_rfc3339()).bind(id.to_string()).execute(pool).await?;
	Ok(())
}

pub async fn find_by_external_id(pool: &SqlitePool, external_job_id: &str) -> Result<Option<JobRow>> {
	sqlx::query_as::<_, JobRow>("SELECT * FROM ai_jobs WHERE external_job_id = ?").bind(external_job_id).fetch_optional(pool).await.map_err(JobStoreError::from)
}

pub async fn find_by_status(pool: &SqlitePool, status: JobStatus, limit: i64) -> Result<Vec<JobRow>> {
	sqlx::query_as::<_, JobRow>("SELECT * FROM ai_jobs WHERE status = ? ORDER BY created_at ASC LIMIT ?")
		.bind(status.as_str())
		.bind(limit)
		.fetch_all(pool)
		.await
		.map_err(JobStoreError::from)
}

/// Rows sitting in a non-terminal status whose `updated_at` predates
/// `older_than` — candidates for zombie reset (spec §4.6, component C8).
pub async fn find_stuck(pool: &SqlitePool, status: JobStatus, older_than: DateTime<Utc>) -> Result<Vec<JobRow>> {
	sqlx::query_as::<_, JobRow>("SELECT * FROM ai_jobs WHERE status = ? AND updated_at < ?")
		.bind(status.as_str())
		.bind(older_than.to_rfc3339())
		.fetch_all(pool)
		.await
		.map_err(JobStoreError::from)
}

/// Every job not yet in a terminal state, for dashboards and the dead-letter
/// reporter's context gathering.
pub async fn list_processable(pool: &SqlitePool, limit: i64) -> Result<Vec<JobRow>> {
	sqlx::query_as::<_, JobRow>(
		r#"
		SELECT * FROM ai_jobs
		WHERE status NOT IN (?, ?, ?)
		ORDER BY created_at ASC
		LIMIT ?
		"#,
	)
	.bind(JobStatus::Completed.as_str())
	.bind(JobStatus::Failed.as_str())
	.bind(JobStatus::Cancelled.as_str())
	.bind(limit)
	.fetch_all(pool)
	.await
	.map_err(JobStoreError::from)
}

pub async fn find_by_meeting(pool: &SqlitePool, meeting_id: uuid::Uuid) -> Result<Vec<JobRow>> {
	sqlx::query_as::<_, JobRow>("SELECT * FROM ai_jobs WHERE meeting_id = ? ORDER BY created_at DESC")
		.bind(meeting_id.to_string())
		.fetch_all(pool)
		.await
		.map_err(JobStoreError::from)
}

pub async fn upsert_transcript(pool: &SqlitePool, new: NewTranscript) -> Result<(TranscriptRow, Vec<UtteranceRow>)> {
	let mut tx = pool.begin().await?;
	let now = now().to_rfc3339();

	let existing_id: Option<String> = sqlx::query_scalar("SELECT id FROM transcripts WHERE meeting_id = ?").bind(new.meeting_id.to_string()).fetch_optional(&mut *tx).await?;

	let id = existing_id.as_ref().map_or_else(uuid::Uuid::new_v4, |s| uuid::Uuid::parse_str(s).unwrap_or_else(|_| uuid::Uuid::new_v4()));

	let has_speakers = !new.speakers.is_empty();
	let speaker_count = has_speakers.then(|| i64::try_from(new.speakers.len()).unwrap_or(i64::MAX));
	let chapters = new.chapters.as_ref().map(serde_json::to_string).transpose().map_err(|e| JobStoreError::Decode(e.to_string()))?;
	let words = new.words.as_ref().map(serde_json::to_string).transpose().map_err(|e| JobStoreError::Decode(e.to_string()))?;
	let raw_data = new.raw_data.as_ref().map(serde_json::to_string).transpose().map_err(|e| JobStoreError::Decode(e.to_string()))?;

	sqlx::query(
		r#"
		INSERT INTO transcripts (id, meeting_id, recording_id, room_id, text, language, confidence, processing_time, has_speakers, speaker_count, model_used, chapters, words, raw_data, created_at, updated_at)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
		ON CONFLICT(meeting_id) DO UPDATE SET
			recording_id = excluded.recording_id,
			room_id = excluded.room_id,
			text = excluded.text,
			language = excluded.language,
			confidence = excluded.confidence,
			processing_time = excluded.processing_time,
			has_speakers = excluded.has_speakers,
			speaker_count = excluded.speaker_count,
			model_used = excluded.model_used,
			chapters = excluded.chapters,
			words = excluded.words,
			raw_data = excluded.raw_data,
			updated_at = excluded.updated_at
		"#,
	)
	.bind(id.to_string())
	.bind(new.meeting_id.to_string())
	.bind(new.recording_id.map(|u| u.to_string()))
	.bind(new.room_id.map(|u| u.to_string()))
	.bind(&new.text)
	.bind(&new.language)
	.bind(new.confidence)
	.bind(new.processing_time)
	.bind(i64::from(has_speakers))
	.bind(speaker_count)
	.bind(&new.model_used)
	.bind(&chapters)
	.bind(&words)
	.bind(&raw_data)
	.bind(&now)
	.bind(&now)
	.execute(&mut *tx)
	.await?;

	sqlx::query("DELETE FROM transcript_utterances WHERE transcript_id = ?").bind(id.to_string()).execute(&mut *tx).await?;

	let mut utterance_rows = Vec::with_capacity(new.speakers.len());
	for speaker in &new.speakers {
		let utterance_id = uuid::Uuid::new_v4();
		sqlx::query(
			r#"
			INSERT INTO transcript_utterances (id, transcript_id, speaker, start_sec, end_sec, text, confidence)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(utterance_id.to_string())
		.bind(id.to_string())
		.bind(&speaker.speaker)
		.bind(speaker.start)
		.bind(speaker.end)
		.bind(&speaker.text)
		.bind(speaker.confidence)
		.execute(&mut *tx)
		.await?;

		utterance_rows.push(UtteranceRow {
			id: utterance_id.to_string(),
			transcript_id: id.to_string(),
			speaker: speaker.speaker.clone(),
			start_sec: speaker.start,
			end_sec: speaker.end,
			text: speaker.text.clone(),
			confidence: speaker.confidence,
		});
	}

	let row = sqlx::query_as::<_, TranscriptRow>("SELECT * FROM transcripts WHERE id = ?").bind(id.to_string()).fetch_one(&mut *tx).await?;

	tx.commit().await?;
	Ok((row, utterance_rows))
}

pub async fn get_transcript_by_meeting(pool: &SqlitePool, meeting_id: uuid::Uuid) -> Result<Option<TranscriptRow>> {
	sqlx::query_as::<_, TranscriptRow>("SELECT * FROM transcripts WHERE meeting_id = ?").bind(meeting_id.to_string()).fetch_optional(pool).await.map_err(JobStoreError::from)
}

pub async fn get_utterances(pool: &SqlitePool, transcript_id: uuid::Uuid) -> Result<Vec<UtteranceRow>> {
	sqlx::query_as::<_, UtteranceRow>("SELECT * FROM transcript_utterances WHERE transcript_id = ? ORDER BY start_sec ASC")
		.bind(transcript_id.to_string())
		.fetch_all(pool)
		.await
		.map_err(JobStoreError::from)
}

/// Spec §9 "Transcript denormalization": keep `transcripts.summary` in sync
/// with the latest `meeting_summaries.executive_summary` for the meeting.
pub async fn update_transcript_summary_field(pool: &SqlitePool, meeting_id: uuid::Uuid, summary_text: &str) -> Result<()> {
	sqlx::query("UPDATE transcripts SET summary = ?, updated_at = ? WHERE meeting_id = ?")
		.bind(summary_text)
		.bind(now().to_rfc3339())
		.bind(meeting_id.to_string())
		.execute(pool)
		.await?;
	Ok(())
}

pub async fn upsert_summary(pool: &SqlitePool, new: NewSummary) -> Result<SummaryRow> {
	let mut tx = pool.begin().await?;
	let now = now().to_rfc3339();

	let existing_id: Option<String> = sqlx::query_scalar("SELECT id FROM meeting_summaries WHERE meeting_id = ?").bind(new.meeting_id.to_string()).fetch_optional(&mut *tx).await?;

	let id = existing_id.as_ref().map_or_else(uuid::Uuid::new_v4, |s| uuid::Uuid::parse_str(s).unwrap_or_else(|_| uuid::Uuid::new_v4()));

	let key_points = serde_json::to_string(&new.key_points).map_err(|e| JobStoreError::Decode(e.to_string()))?;
	let decisions = serde_json::to_string(&new.decisions).map_err(|e| JobStoreError::Decode(e.to_string()))?;
	let topics = serde_json::to_string(&new.topics).map_err(|e| JobStoreError::Decode(e.to_string()))?;
	let open_questions = serde_json::to_string(&new.open_questions).map_err(|e| JobStoreError::Decode(e.to_string()))?;
	let next_steps = serde_json::to_string(&new.next_steps).map_err(|e| JobStoreError::Decode(e.to_string()))?;
	let sentiment_breakdown = serde_json::to_string(&new.sentiment_breakdown).map_err(|e| JobStoreError::Decode(e.to_string()))?;

	sqlx::query(
		r#"
		INSERT INTO meeting_summaries (
			id, meeting_id, transcript_id, executive_summary, key_points, decisions, topics,
			open_questions, next_steps, overall_sentiment, sentiment_breakdown, total_speaking_time,
			participant_balance, engagement_score, model_used, processing_time_ms, created_at, updated_at
		) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
		ON CONFLICT(meeting_id) DO UPDATE SET
			transcript_id = excluded.transcript_id,
			executive_summary = excluded.executive_summary,
			key_points = excluded.key_points,
			decisions = excluded.decisions,
			topics = excluded.topics,
			open_questions = excluded.open_questions,
			next_steps = excluded.next_steps,
			overall_sentiment = excluded.overall_sentiment,
			sentiment_breakdown = excluded.sentiment_breakdown,
			total_speaking_time = excluded.total_speaking_time,
			participant_balance = excluded.participant_balance,
			engagement_score = excluded.engagement_score,
			model_used = excluded.model_used,
			processing_time_ms = excluded.processing_time_ms,
			updated_at = excluded.updated_at
		"#,
	)
	.bind(id.to_string())
	.bind(new.meeting_id.to_string())
	.bind(new.transcript_id.to_string())
	.bind(&new.executive_summary)
	.bind(&key_points)
	.bind(&decisions)
	.bind(&topics)
	.bind(&open_questions)
	.bind(&next_steps)
	.bind(&new.overall_sentiment)
	.bind(&sentiment_breakdown)
	.bind(new.total_speaking_time)
	.bind(new.participant_balance)
	.bind(new.engagement_score)
	.bind(&new.model_used)
	.bind(new.processing_time_ms)
	.bind(&now)
	.bind(&now)
	.execute(&mut *tx)
	.await?;

	let row = sqlx::query_as::<_, SummaryRow>("SELECT * FROM meeting_summaries WHERE id = ?").bind(id.to_string()).fetch_one(&mut *tx).await?;

	tx.commit().await?;
	Ok(row)
}

pub async fn insert_action_items(pool: &SqlitePool, items: Vec<NewActionItem>) -> Result<Vec<ActionItemRow>> {
	if items.is_empty() {
		return Ok(Vec::new());
	}

	let mut tx = pool.begin().await?;
	let mut rows = Vec::with_capacity(items.len());

	for item in items {
		let id = uuid::Uuid::new_v4();
		sqlx::query(
			r#"
			INSERT INTO action_items (id, meeting_id, summary_id, title, description, item_type, priority, status, transcript_reference, timestamp_in_meeting)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(item.meeting_id.to_string())
		.bind(item.summary_id.to_string())
		.bind(&item.title)
		.bind(&item.description)
		.bind(item.item_type.as_str())
		.bind(item.priority.as_str())
		.bind(item.status.as_str())
		.bind(&item.transcript_reference)
		.bind(item.timestamp_in_meeting)
		.execute(&mut *tx)
		.await?;

		rows.push(ActionItemRow {
			id: id.to_string(),
			meeting_id: item.meeting_id.to_string(),
			summary_id: item.summary_id.to_string(),
			title: item.title,
			description: item.description,
			item_type: item.item_type.as_str().to_string(),
			priority: item.priority.as_str().to_string(),
			status: item.status.as_str().to_string(),
			transcript_reference: item.transcript_reference,
			timestamp_in_meeting: item.timestamp_in_meeting,
		});
	}

	tx.commit().await?;
	Ok(rows)
}

pub async fn get_action_items_by_summary(pool: &SqlitePool, summary_id: uuid::Uuid) -> Result<Vec<ActionItemRow>> {
	sqlx::query_as::<_, ActionItemRow>("SELECT * FROM action_items WHERE summary_id = ?").bind(summary_id.to_string()).fetch_all(pool).await.map_err(JobStoreError::from)
}

use job_store::JobStore;
use pipeline_types::transcript::{NewTranscript, NewUtterance};
use pipeline_types::Job;
use transcription_client::GetTranscriptResponse;

use crate::error::Result;
use crate::meeting_context::MeetingContext;

/// Drives a completed transcript through persistence and into
/// `transcript_ready`. Shared by the webhook ingestor and the
/// webhook-timeout poller so both entry points land on identical
/// behavior. Idempotent: repeated calls for the same meeting upsert the
/// transcript and its utterances rather than duplicating them, and the
/// status CAS underneath `mark_transcript_ready` means a job already past
/// this step is simply left as-is.
#[tracing::instrument(skip(job_store, meeting_context, fetched), fields(job_id = %job.id, meeting_id = %job.meeting_id))]
pub async fn persist_completed_transcript(job_store: &JobStore, meeting_context: &dyn MeetingContext, job: &Job, fetched: GetTranscriptResponse, default_language: &str) -> Result<Job> {
	let recording_id = meeting_context.recent_recording_id(job.meeting_id).await;
	let room_id = meeting_context.room_id(job.meeting_id).await;

	// The provider reports `start`/`end` in milliseconds; §3 stores
	// utterance offsets in seconds (spec §8 S1: `start:0, end:3500` persists
	// as `start=0.0, end=3.5`).
	let speakers = fetched
		.utterances
		.into_iter()
		.map(|u| NewUtterance { speaker: u.speaker, start: u.start / 1000.0, end: u.end / 1000.0, text: u.text, confidence: u.confidence })
		.collect::<Vec<_>>();

	let new_transcript = NewTranscript {
		meeting_id: job.meeting_id,
		recording_id,
		room_id,
		text: fetched.text.unwrap_or_default(),
		language: fetched.language_code.unwrap_or_else(|| default_language.to_string()),
		confidence: fetched.confidence,
		processing_time: fetched.audio_duration,
		speakers,
		model_used: Some("assemblyai".to_string()),
		chapters: fetched.chapters,
		words: fetched.words,
		raw_data: None,
	};

	let (transcript, _utterances) = job_store.upsert_transcript(new_transcript).await?;

	let updated = job_store.mark_transcript_ready(job.id, transcript.id).await?.unwrap_or_else(|| job.clone());
	Ok(updated)
}

#[cfg(test)]
mod tests {
	use pipeline_types::job::NewJob;
	use pipeline_types::JobType;
	use sqlx::sqlite::SqlitePoolOptions;
	use transcription_client::{GetTranscriptResponse, ProviderStatus, ProviderUtterance};

	use super::*;
	use crate::meeting_context::NullMeetingContext;

	#[tokio::test]
	async fn provider_millisecond_offsets_persist_as_seconds() {
		let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.expect("pool");
		let store = JobStore::new(pool);
		store.run_migrations().await.expect("migrations");

		let meeting_id = uuid::Uuid::new_v4();
		let job = store.create(NewJob { meeting_id, job_type: JobType::Transcription, recording_url: "https://example.com/a.mp3".to_string(), max_retries: 3 }).await.unwrap();
		store.claim_pending(10).await.unwrap();
		store.mark_submitted(job.id, "tx_A").await.unwrap();

		let fetched = GetTranscriptResponse {
			status: ProviderStatus::Completed,
			text: Some("hello world".to_string()),
			language_code: Some("vi".to_string()),
			confidence: Some(0.93),
			audio_duration: Some(600.0),
			utterances: vec![ProviderUtterance { speaker: "A".to_string(), start: 0.0, end: 3500.0, text: "hello".to_string(), confidence: Some(0.95) }],
			words: None,
			chapters: None,
			error: None,
		};

		persist_completed_transcript(&store, &NullMeetingContext, &job, fetched, "vi").await.expect("persists");

		let transcript = store.get_transcript_by_meeting(meeting_id).await.unwrap().expect("transcript present");
		let utterances = store.get_utterances(transcript.id).await.unwrap();
		assert_eq!(utterances.len(), 1);
		assert!((utterances[0].start - 0.0).abs() < f64::EPSILON);
		assert!((utterances[0].end - 3.5).abs() < f64::EPSILON);
	}
}

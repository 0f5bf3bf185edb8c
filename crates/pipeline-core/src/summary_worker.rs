use std::sync::Arc;
use std::time::Instant;

use analysis_client::AnalysisClient;
use analysis_parser::{detect_language_mix, extract_action_items, parse, validate_transcript_length};
use job_store::JobStore;
use pipeline_types::summary::NewSummary;
use pipeline_types::{Job, JobStatus, JobType, Transcript, Utterance};
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;

/// Component C7 (spec §4.7). Claims `transcript_ready` jobs, formats the
/// transcript (speaker-segmented when utterances exist), calls the LLM,
/// parses and validates its output, and persists the summary and action
/// items in one logical step before completing the job.
pub struct SummaryWorker {
	job_store: JobStore,
	analysis_client: AnalysisClient,
	config: Arc<PipelineConfig>,
}

impl SummaryWorker {
	#[must_use]
	pub fn new(job_store: JobStore, analysis_client: AnalysisClient, config: Arc<PipelineConfig>) -> Self {
		Self { job_store, analysis_client, config }
	}

	pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
		let mut ticker = tokio::time::interval(self.config.summary_poll_interval);
		loop {
			tokio::select! {
				() = cancel.cancelled() => {
					tracing::info!("summary worker stopping");
					return;
				}
				_ = ticker.tick() => {
					if let Err(e) = self.tick().await {
						tracing::error!(error = %e, "summary worker tick failed");
					}
				}
			}
		}
	}

	async fn tick(&self) -> job_store::Result<()> {
		let candidates = self.job_store.find_by_status(JobStatus::TranscriptReady, 20).await?;

		for job in candidates {
			let Some(claimed) = self.job_store.claim_transcript_ready(job.id).await? else {
				// Another summary worker won this claim; skip (conflict, not an error).
				continue;
			};

			if claimed.job_type != JobType::Transcription {
				tracing::debug!(job_id = %claimed.id, job_type = %claimed.job_type, "non-transcription job type, leaving at claimed status");
				continue;
			}

			let job_store = self.job_store.clone();
			let analysis_client = self.analysis_client.clone();
			let per_job_timeout = self.config.per_job_timeout;
			let llm_model = self.config.llm_model.clone();

			tokio::spawn(async move {
				let result = tokio::time::timeout(per_job_timeout, process_job(&job_store, &analysis_client, &claimed, &llm_model)).await;

				match result {
					Ok(Ok(())) => {}
					Ok(Err(err)) => {
						tracing::warn!(job_id = %claimed.id, error = %err, "summary generation failed");
						if let Err(e) = job_store.increment_retry(claimed.id, &err, JobStatus::TranscriptReady).await {
							tracing::error!(job_id = %claimed.id, error = %e, "failed to record summary failure");
						}
					}
					Err(_elapsed) => {
						tracing::warn!(job_id = %claimed.id, "summary generation exceeded per-job timeout");
						if let Err(e) = job_store.increment_retry(claimed.id, "per-job timeout exceeded", JobStatus::TranscriptReady).await {
							tracing::error!(job_id = %claimed.id, error = %e, "failed to record timeout");
						}
					}
				}
			});
		}

		Ok(())
	}
}

/// Formats a transcript's utterances into `"[MM:SS Speaker]: text\n"`
/// lines (spec §4.7 step 2). Callers fall back to the flat transcript
/// text when there are no utterances.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_speaker_segmented(utterances: &[Utterance]) -> String {
	let mut out = String::new();
	for u in utterances {
		let total_secs = u.start.max(0.0) as u64;
		let mm = total_secs / 60;
		let ss = total_secs % 60;
		out.push_str(&format!("[{mm:02}:{ss:02} {}]: {}\n", u.speaker, u.text));
	}
	out
}

async fn process_job(job_store: &JobStore, analysis_client: &AnalysisClient, job: &Job, llm_model: &str) -> Result<(), String> {
	let started = Instant::now();

	let transcript = job_store.get_transcript_by_meeting(job.meeting_id).await.map_err(|e| e.to_string())?.ok_or_else(|| "no transcript found for meeting".to_string())?;

	let utterances = job_store.get_utterances(transcript.id).await.map_err(|e| e.to_string())?;

	let formatted = if utterances.is_empty() {
		tracing::warn!(job_id = %job.id, meeting_id = %job.meeting_id, "no utterances, falling back to flat transcript text");
		transcript.text.clone()
	} else {
		format_speaker_segmented(&utterances)
	};

	// The char/word floors (spec §4.4/B1) are defined over the transcript
	// text itself, not the "[MM:SS Speaker]: "-prefixed string built for the
	// LLM prompt — the prefixes would inflate both counts.
	let duration = transcript.processing_time.unwrap_or(0.0);
	if !validate_transcript_length(&transcript.text, duration) {
		return complete_with_minimal_summary(job_store, job, &transcript).await;
	}

	let (_is_mixed, detected_language, _ratio) = detect_language_mix(&formatted);
	let language = choose_language(&detected_language, &transcript.language);

	let raw = analysis_client.generate_structured_analysis(&formatted, &language).await.map_err(|e| e.to_string())?;
	let result = parse(&raw).map_err(|e| e.to_string())?;

	let processing_time_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

	let new_summary = NewSummary {
		meeting_id: job.meeting_id,
		transcript_id: transcript.id,
		executive_summary: result.executive_summary.clone(),
		key_points: result.key_points.clone(),
		decisions: result.decisions.iter().map(|d| d.text.clone()).collect(),
		topics: result.topics.clone(),
		open_questions: result.open_questions.clone(),
		next_steps: result.next_steps.iter().map(|s| s.text.clone()).collect(),
		overall_sentiment: result.overall_sentiment.clone(),
		sentiment_breakdown: result.sentiment_breakdown.clone(),
		total_speaking_time: result.total_speaking_time,
		participant_balance: result.participant_balance,
		engagement_score: result.engagement_score,
		model_used: Some(llm_model.to_string()),
		processing_time_ms: Some(processing_time_ms),
	};

	let summary = job_store.upsert_summary(new_summary).await.map_err(|e| e.to_string())?;

	let action_items = extract_action_items(job.meeting_id, summary.id, &result);
	job_store.insert_action_items(action_items).await.map_err(|e| e.to_string())?;

	job_store.update_transcript_summary_field(job.meeting_id, &result.executive_summary).await.map_err(|e| e.to_string())?;

	job_store.mark_completed(job.id).await.map_err(|e| e.to_string())?;

	Ok(())
}

/// The minimal-summary fast path (spec §4.4, law L4, scenario S5): a
/// transcript too short to analyze completes without ever calling the LLM.
async fn complete_with_minimal_summary(job_store: &JobStore, job: &Job, transcript: &Transcript) -> Result<(), String> {
	let minimal = NewSummary::minimal(job.meeting_id, transcript.id);
	job_store.upsert_summary(minimal.clone()).await.map_err(|e| e.to_string())?;
	job_store.update_transcript_summary_field(job.meeting_id, &minimal.executive_summary).await.map_err(|e| e.to_string())?;
	job_store.mark_completed(job.id).await.map_err(|e| e.to_string())?;
	Ok(())
}

/// Spec §4.7 step 4: prefer the detected primary language, falling back
/// to the transcript's own recorded language, then `"en"`.
fn choose_language(detected: &str, transcript_language: &str) -> String {
	if !detected.is_empty() {
		detected.to_string()
	} else if !transcript_language.is_empty() {
		transcript_language.to_string()
	} else {
		"en".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use analysis_client::AnalysisClient;
	use pipeline_types::job::NewJob;
	use pipeline_types::transcript::{NewTranscript, NewUtterance};
	use pipeline_types::{JobType, Utterance};
	use sqlx::sqlite::SqlitePoolOptions;

	#[test]
	fn format_speaker_segmented_builds_mm_ss_lines() {
		let utterances = vec![Utterance { id: uuid::Uuid::new_v4(), transcript_id: uuid::Uuid::new_v4(), speaker: "A".to_string(), start: 65.0, end: 70.0, text: "hello".to_string(), confidence: Some(0.9) }];
		let formatted = format_speaker_segmented(&utterances);
		assert_eq!(formatted, "[01:05 A]: hello\n");
	}

	#[test]
	fn choose_language_prefers_detected() {
		assert_eq!(choose_language("en", "vi"), "en");
	}

	#[test]
	fn choose_language_falls_back_to_transcript_language() {
		assert_eq!(choose_language("", "vi"), "vi");
	}

	#[test]
	fn choose_language_falls_back_to_en_when_nothing_known() {
		assert_eq!(choose_language("", ""), "en");
	}

	async fn test_store() -> JobStore {
		let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.expect("in-memory sqlite");
		let store = JobStore::new(pool);
		store.run_migrations().await.expect("migrations");
		store
	}

	fn analysis_client(base_url: String) -> AnalysisClient {
		AnalysisClient::new(reqwest::Client::new(), base_url, "sk-test", "gpt-4o-mini", 0.3, 8000)
	}

	/// A transcript whose raw text is well under the 100-char/20-word floor
	/// must take the minimal-summary path even though speaker-segmented
	/// formatting (with its `"[MM:SS Speaker]: "` prefixes) would pad the
	/// same content past both floors.
	#[tokio::test]
	async fn short_transcript_text_takes_minimal_path_despite_padded_formatting() {
		let store = test_store().await;
		let meeting_id = uuid::Uuid::new_v4();
		let job = store.create(NewJob { meeting_id, job_type: JobType::Transcription, recording_url: "https://example.com/a.mp3".to_string(), max_retries: 3 }).await.unwrap();

		// 25 speaker-prefixed lines easily clear 100 chars / 20 words, but
		// the underlying transcript text is a single short word.
		let speakers = (0..25)
			.map(|i| NewUtterance { speaker: "A".to_string(), start: f64::from(i), end: f64::from(i) + 1.0, text: "hi".to_string(), confidence: Some(0.9) })
			.collect::<Vec<_>>();

		let (transcript, _) = store
			.upsert_transcript(NewTranscript {
				meeting_id,
				recording_id: None,
				room_id: None,
				text: "hi".to_string(),
				language: "en".to_string(),
				confidence: Some(0.9),
				processing_time: Some(120.0),
				speakers,
				model_used: Some("assemblyai".to_string()),
				chapters: None,
				words: None,
				raw_data: None,
			})
			.await
			.unwrap();

		store.claim_pending(10).await.unwrap();
		store.mark_submitted(job.id, "tx_A").await.unwrap();
		store.mark_transcript_ready(job.id, transcript.id).await.unwrap();
		let claimed = store.claim_transcript_ready(job.id).await.unwrap().expect("claim");

		// No mock registered: the LLM must never be called on this path.
		let server = mockito::Server::new_async().await;
		let client = analysis_client(server.url());

		process_job(&store, &client, &claimed, "gpt-4o-mini").await.expect("process_job succeeds via minimal path");

		let executive_summary: String = sqlx::query_scalar("SELECT executive_summary FROM meeting_summaries WHERE meeting_id = ?")
			.bind(meeting_id.to_string())
			.fetch_one(store.pool())
			.await
			.expect("summary row present");
		assert_eq!(executive_summary, pipeline_types::summary::MINIMAL_SUMMARY_TEXT);

		let completed = store.get(job.id).await.unwrap().expect("job present");
		assert_eq!(completed.status, JobStatus::Completed);
	}

	/// The recorded `Summary.model_used` is the configured model name, not a
	/// hardcoded placeholder.
	#[tokio::test]
	async fn completed_summary_records_configured_model_name() {
		let store = test_store().await;
		let meeting_id = uuid::Uuid::new_v4();
		let job = store.create(NewJob { meeting_id, job_type: JobType::Transcription, recording_url: "https://example.com/a.mp3".to_string(), max_retries: 3 }).await.unwrap();

		let long_text = std::iter::repeat("word").take(40).collect::<Vec<_>>().join(" ");
		let (transcript, _) = store
			.upsert_transcript(NewTranscript {
				meeting_id,
				recording_id: None,
				room_id: None,
				text: long_text,
				language: "en".to_string(),
				confidence: Some(0.9),
				processing_time: Some(120.0),
				speakers: vec![],
				model_used: Some("assemblyai".to_string()),
				chapters: None,
				words: None,
				raw_data: None,
			})
			.await
			.unwrap();

		store.claim_pending(10).await.unwrap();
		store.mark_submitted(job.id, "tx_B").await.unwrap();
		store.mark_transcript_ready(job.id, transcript.id).await.unwrap();
		let claimed = store.claim_transcript_ready(job.id).await.unwrap().expect("claim");

		let mut server = mockito::Server::new_async().await;
		server
			.mock("POST", "/chat/completions")
			.with_status(200)
			.with_body(r#"{"choices":[{"message":{"content":"{\"executive_summary\":\"All good\"}"}}]}"#)
			.create_async()
			.await;
		let client = analysis_client(server.url());

		process_job(&store, &client, &claimed, "gpt-4o-mini").await.expect("process_job succeeds");

		let model_used: Option<String> = sqlx::query_scalar("SELECT model_used FROM meeting_summaries WHERE meeting_id = ?")
			.bind(meeting_id.to_string())
			.fetch_one(store.pool())
			.await
			.expect("summary row present");
		assert_eq!(model_used.as_deref(), Some("gpt-4o-mini"));

		let completed = store.get(job.id).await.unwrap().expect("job present");
		assert_eq!(completed.status, JobStatus::Completed);
	}
}

use std::sync::Arc;

use job_store::JobStore;
use pipeline_types::JobStatus;
use tokio_util::sync::CancellationToken;
use transcription_client::{ProviderStatus, TranscriptionClient};

use crate::completion::persist_completed_transcript;
use crate::config::PipelineConfig;
use crate::meeting_context::MeetingContext;

/// Component C8's zombie resetter (spec §4.8). Recovers `summarizing` jobs
/// whose worker crashed mid-analysis by resetting them back to
/// `transcript_ready` once they've sat stale past `zombie_age`.
pub struct ZombieResetter {
	job_store: JobStore,
	config: Arc<PipelineConfig>,
}

impl ZombieResetter {
	#[must_use]
	pub fn new(job_store: JobStore, config: Arc<PipelineConfig>) -> Self {
		Self { job_store, config }
	}

	pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
		let mut ticker = tokio::time::interval(self.config.zombie_check_interval);
		loop {
			tokio::select! {
				() = cancel.cancelled() => {
					tracing::info!("zombie resetter stopping");
					return;
				}
				_ = ticker.tick() => {
					if let Err(e) = self.tick().await {
						tracing::error!(error = %e, "zombie reset tick failed");
					}
				}
			}
		}
	}

	async fn tick(&self) -> job_store::Result<()> {
		let cutoff = chrono::Utc::now() - chrono::Duration::from_std(self.config.zombie_age).unwrap_or_default();
		let stuck = self.job_store.find_stuck(JobStatus::Summarizing, cutoff).await?;

		for job in stuck {
			tracing::warn!(job_id = %job.id, "resetting zombie job stuck in summarizing");
			self.job_store.update_status(job.id, JobStatus::TranscriptReady).await?;
		}

		Ok(())
	}
}

/// Component C8's webhook-timeout poller (spec §4.8). Polls the provider
/// directly for `submitted` jobs whose webhook never arrived, driving the
/// same completion path as the webhook ingestor so a lost delivery still
/// converges within one poll cycle (law L3).
pub struct WebhookTimeoutPoller {
	job_store: JobStore,
	transcription_client: TranscriptionClient,
	meeting_context: Arc<dyn MeetingContext>,
	config: Arc<PipelineConfig>,
}

impl WebhookTimeoutPoller {
	#[must_use]
	pub fn new(job_store: JobStore, transcription_client: TranscriptionClient, meeting_context: Arc<dyn MeetingContext>, config: Arc<PipelineConfig>) -> Self {
		Self { job_store, transcription_client, meeting_context, config }
	}

	pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
		let mut ticker = tokio::time::interval(self.config.webhook_timeout_check_interval);
		loop {
			tokio::select! {
				() = cancel.cancelled() => {
					tracing::info!("webhook-timeout poller stopping");
					return;
				}
				_ = ticker.tick() => {
					if let Err(e) = self.tick().await {
						tracing::error!(error = %e, "webhook-timeout poll tick failed");
					}
				}
			}
		}
	}

	async fn tick(&self) -> job_store::Result<()> {
		let cutoff = chrono::Utc::now() - chrono::Duration::from_std(self.config.webhook_timeout_age).unwrap_or_default();
		let stuck = self.job_store.find_stuck(JobStatus::Submitted, cutoff).await?;

		for job in stuck {
			let Some(external_id) = job.external_job_id.clone() else {
				tracing::warn!(job_id = %job.id, "submitted job missing external_job_id past timeout window");
				self.job_store.mark_failed(job.id, "no external transcript id").await?;
				continue;
			};

			match self.transcription_client.get(&external_id).await {
				Ok(fetched) => match fetched.status {
					ProviderStatus::Completed => {
						if let Err(e) = persist_completed_transcript(&self.job_store, self.meeting_context.as_ref(), &job, fetched, &self.config.transcription_default_language).await {
							tracing::error!(job_id = %job.id, error = %e, "failed to persist transcript fetched by poller");
						}
					}
					ProviderStatus::Error => {
						self.job_store.mark_failed(job.id, fetched.error.as_deref().unwrap_or("transcription provider reported an error")).await?;
					}
					ProviderStatus::Queued | ProviderStatus::Processing => {
						// Heartbeat resets the timeout window without
						// changing status (spec §4.8).
						self.job_store.heartbeat(job.id).await?;
					}
				},
				Err(e) => {
					tracing::warn!(job_id = %job.id, error = %e, "webhook-timeout poll fetch failed, will retry next cycle");
				}
			}
		}

		Ok(())
	}
}

/// Component C8's dead-letter reporter (spec §4.8). Purely observational:
/// it never mutates a job, only surfaces terminally failed jobs as
/// structured log events for an operator to act on.
pub struct DeadLetterReporter {
	job_store: JobStore,
	config: Arc<PipelineConfig>,
}

impl DeadLetterReporter {
	#[must_use]
	pub fn new(job_store: JobStore, config: Arc<PipelineConfig>) -> Self {
		Self { job_store, config }
	}

	pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
		let mut ticker = tokio::time::interval(self.config.dead_letter_report_interval);
		loop {
			tokio::select! {
				() = cancel.cancelled() => {
					tracing::info!("dead-letter reporter stopping");
					return;
				}
				_ = ticker.tick() => {
					if let Err(e) = self.tick().await {
						tracing::error!(error = %e, "dead-letter report tick failed");
					}
				}
			}
		}
	}

	async fn tick(&self) -> job_store::Result<()> {
		let failed = self.job_store.find_by_status(JobStatus::Failed, 100).await?;

		for job in failed {
			if job.retries_exhausted() {
				tracing::error!(
					job_id = %job.id,
					meeting_id = %job.meeting_id,
					retry_count = job.retry_count,
					max_retries = job.max_retries,
					last_error = job.last_error.as_deref().unwrap_or("unknown"),
					"job requires operator attention: retries exhausted"
				);
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pipeline_types::job::NewJob;
	use pipeline_types::JobType;
	use sqlx::sqlite::SqlitePoolOptions;
	use std::time::Duration;

	async fn store() -> JobStore {
		let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.expect("pool");
		let store = JobStore::new(pool);
		store.run_migrations().await.expect("migrations");
		store
	}

	#[tokio::test]
	async fn zombie_resetter_moves_stale_summarizing_back_to_transcript_ready() {
		let store = store().await;
		let meeting_id = uuid::Uuid::new_v4();
		let job = store.create(NewJob { meeting_id, job_type: JobType::Transcription, recording_url: "https://example.com/a.mp3".to_string(), max_retries: 3 }).await.unwrap();
		store.claim_pending(10).await.unwrap();
		store.mark_submitted(job.id, "tx_A").await.unwrap();
		store.update_status(job.id, JobStatus::Summarizing).await.unwrap();

		let config = Arc::new(PipelineConfig::test());
		let resetter = ZombieResetter::new(store.clone(), config);

		// Force a cutoff in the far future so "now" always looks stale.
		let cutoff = chrono::Utc::now() + chrono::Duration::days(1);
		let stuck = store.find_stuck(JobStatus::Summarizing, cutoff).await.unwrap();
		assert_eq!(stuck.len(), 1);

		resetter.tick().await.unwrap();
		let updated = store.get(job.id).await.unwrap().unwrap();
		assert_eq!(updated.status, JobStatus::TranscriptReady);
	}

	#[tokio::test]
	async fn dead_letter_reporter_does_not_mutate_jobs() {
		let store = store().await;
		let meeting_id = uuid::Uuid::new_v4();
		let job = store.create(NewJob { meeting_id, job_type: JobType::Transcription, recording_url: "https://example.com/b.mp3".to_string(), max_retries: 0 }).await.unwrap();
		store.claim_pending(10).await.unwrap();
		store.increment_retry(job.id, "boom", JobStatus::Pending).await.unwrap();

		let before = store.get(job.id).await.unwrap().unwrap();
		assert_eq!(before.status, JobStatus::Failed);

		let config = Arc::new(PipelineConfig::test());
		let reporter = DeadLetterReporter::new(store.clone(), config);
		reporter.tick().await.unwrap();

		let after = store.get(job.id).await.unwrap().unwrap();
		assert_eq!(after, before, "the dead-letter reporter is read-only");
	}

	#[test]
	fn duration_conversion_is_lossless_for_configured_ages() {
		let d = Duration::from_secs(600);
		assert_eq!(chrono::Duration::from_std(d).unwrap(), chrono::Duration::seconds(600));
	}
}

use std::sync::Arc;

use job_store::JobStore;
use pipeline_types::{JobStatus, JobType};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use transcription_client::{SubmitOptions, TranscriptionClient};

use crate::backoff::Backoff;
use crate::config::PipelineConfig;

/// Component C5 (spec §4.5). Claims `pending`/`retrying` jobs under a
/// bounded upload semaphore, uploads the recording to the transcription
/// provider, and submits it — persisting `external_job_id` *before*
/// releasing the slot so the webhook race (provider callback racing the
/// in-process submit) always finds the job by external id.
pub struct SubmissionWorker {
	job_store: JobStore,
	transcription_client: TranscriptionClient,
	http: reqwest::Client,
	upload_semaphore: Arc<Semaphore>,
	config: Arc<PipelineConfig>,
}

impl SubmissionWorker {
	#[must_use]
	pub fn new(job_store: JobStore, transcription_client: TranscriptionClient, http: reqwest::Client, config: Arc<PipelineConfig>) -> Self {
		let upload_semaphore = Arc::new(Semaphore::new(config.upload_concurrency));
		Self { job_store, transcription_client, http, upload_semaphore, config }
	}

	/// Runs until `cancel` fires. Each iteration claims a batch of jobs and
	/// spawns one task per job so the upload semaphore — not the worker
	/// count — is what bounds concurrent uploads (spec §5).
	pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
		let mut ticker = tokio::time::interval(self.config.submission_poll_interval);
		loop {
			tokio::select! {
				() = cancel.cancelled() => {
					tracing::info!("submission worker stopping");
					return;
				}
				_ = ticker.tick() => {
					if let Err(e) = self.tick().await {
						tracing::error!(error = %e, "submission worker tick failed");
					}
				}
			}
		}
	}

	async fn tick(&self) -> job_store::Result<()> {
		// Claim more than the semaphore capacity so uploads queue behind it
		// rather than leaving the batch under-subscribed while a slow upload
		// holds a permit.
		let limit = i64::try_from(self.config.upload_concurrency * 4).unwrap_or(i64::MAX);
		let claimed = self.job_store.claim_pending(limit).await?;

		for job in claimed {
			let job_store = self.job_store.clone();
			let transcription_client = self.transcription_client.clone();
			let http = self.http.clone();
			let semaphore = self.upload_semaphore.clone();
			let default_language = self.config.transcription_default_language.clone();
			let webhook_url = self.config.transcription_webhook_base_url.clone();
			let backoff_initial = self.config.backoff_initial;
			let backoff_max = self.config.backoff_max;
			let backoff_cap = self.config.backoff_cap;

			tokio::spawn(async move {
				if job.job_type != JobType::Transcription {
					tracing::debug!(job_id = %job.id, job_type = %job.job_type, "non-transcription job type, leaving submitted without an external id (open question resolution)");
					return;
				}

				let Ok(permit) = semaphore.acquire_owned().await else {
					return;
				};

				let outcome = submit_with_retry(&transcription_client, &http, &job.recording_url, &default_language, webhook_url.as_deref(), backoff_initial, backoff_max, backoff_cap).await;

				match outcome {
					Ok(external_id) => {
						if let Err(e) = job_store.mark_submitted(job.id, &external_id).await {
							tracing::error!(job_id = %job.id, error = %e, "failed to persist external_job_id after successful submit");
						} else {
							tracing::info!(job_id = %job.id, external_id, "submitted to transcription provider");
						}
					}
					Err(err) => {
						tracing::warn!(job_id = %job.id, error = %err, "submission failed");
						if let Err(e) = job_store.increment_retry(job.id, &err, JobStatus::Pending).await {
							tracing::error!(job_id = %job.id, error = %e, "failed to record submission failure");
						}
					}
				}

				// Slot is held until the external id is durably persisted,
				// closing the webhook race (spec §4.5 step 4).
				drop(permit);
			});
		}

		Ok(())
	}
}

/// Downloads the recording and submits it to the provider, retrying
/// transient failures with exponential backoff (spec §4.5 step 5, S3).
/// Permanent (4xx) failures are not retried. Returns the provider's
/// external id on success.
async fn submit_with_retry(
	transcription_client: &TranscriptionClient,
	http: &reqwest::Client,
	recording_url: &str,
	language: &str,
	webhook_url: Option<&str>,
	backoff_initial: std::time::Duration,
	backoff_max: std::time::Duration,
	backoff_cap: std::time::Duration,
) -> Result<String, String> {
	let mut backoff = Backoff::new(backoff_initial, backoff_max, backoff_cap);

	loop {
		match try_submit_once(transcription_client, http, recording_url, language, webhook_url).await {
			Ok(external_id) => return Ok(external_id),
			Err((kind, message)) => {
				if !kind.is_retryable() {
					return Err(message);
				}
				match backoff.next_delay() {
					Some(delay) => {
						tracing::debug!(recording_url, delay_ms = delay.as_millis() as u64, "retrying submission after transient failure");
						tokio::time::sleep(delay).await;
					}
					None => return Err(message),
				}
			}
		}
	}
}

async fn try_submit_once(
	transcription_client: &TranscriptionClient,
	http: &reqwest::Client,
	recording_url: &str,
	language: &str,
	webhook_url: Option<&str>,
) -> Result<String, (pipeline_types::ErrorKind, String)> {
	let resp = http.get(recording_url).send().await.map_err(|e| (pipeline_types::ErrorKind::TransientNetwork, format!("recording download failed: {e}")))?;
	if !resp.status().is_success() {
		let status = resp.status();
		let kind = if status.is_server_error() { pipeline_types::ErrorKind::TransientNetwork } else { pipeline_types::ErrorKind::Provider4xx };
		return Err((kind, format!("recording download returned {status}")));
	}
	let bytes = resp.bytes().await.map_err(|e| (pipeline_types::ErrorKind::TransientNetwork, format!("recording download body failed: {e}")))?;

	let upload_url = transcription_client.upload(bytes.to_vec()).await.map_err(|e| (e.kind(), e.to_string()))?;

	let opts = SubmitOptions { language_code: language.to_string(), speaker_labels: true, webhook_url: webhook_url.map(str::to_string) };
	let submitted = transcription_client.submit(&upload_url, &opts).await.map_err(|e| (e.kind(), e.to_string()))?;

	Ok(submitted.id)
}

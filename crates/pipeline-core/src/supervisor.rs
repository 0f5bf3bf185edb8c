use std::sync::Arc;

use analysis_client::AnalysisClient;
use job_store::JobStore;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use transcription_client::TranscriptionClient;

use crate::config::PipelineConfig;
use crate::error::{PipelineCoreError, Result};
use crate::meeting_context::MeetingContext;
use crate::reconciliation::{DeadLetterReporter, WebhookTimeoutPoller, ZombieResetter};
use crate::submission_worker::SubmissionWorker;
use crate::summary_worker::SummaryWorker;

struct RunningPool {
	cancel: CancellationToken,
	handles: Vec<JoinHandle<()>>,
}

/// Owns the lifetime of every background task in the pipeline: the
/// submission worker, the configured number of summary workers, and the
/// three reconciliation loops (spec §4.9). Starting twice without an
/// intervening `stop` is a programming error, not a silent no-op.
pub struct PoolSupervisor {
	job_store: JobStore,
	transcription_client: TranscriptionClient,
	analysis_client: AnalysisClient,
	meeting_context: Arc<dyn MeetingContext>,
	http: reqwest::Client,
	config: Arc<PipelineConfig>,
	running: Mutex<Option<RunningPool>>,
}

impl PoolSupervisor {
	#[must_use]
	pub fn new(job_store: JobStore, transcription_client: TranscriptionClient, analysis_client: AnalysisClient, meeting_context: Arc<dyn MeetingContext>, http: reqwest::Client, config: Arc<PipelineConfig>) -> Self {
		Self { job_store, transcription_client, analysis_client, meeting_context, http, config, running: Mutex::new(None) }
	}

	/// Spawns one submission worker, `worker_count` summary workers, and the
	/// three reconciliation loops, all sharing a single `CancellationToken`.
	pub async fn start(&self, worker_count: usize) -> Result<()> {
		let mut guard = self.running.lock().await;
		if guard.is_some() {
			return Err(PipelineCoreError::AlreadyRunning);
		}

		let cancel = CancellationToken::new();
		let mut handles = Vec::with_capacity(worker_count + 4);

		let submission_worker = Arc::new(SubmissionWorker::new(self.job_store.clone(), self.transcription_client.clone(), self.http.clone(), Arc::clone(&self.config)));
		handles.push(tokio::spawn(submission_worker.run(cancel.clone())));

		for _ in 0..worker_count.max(1) {
			let summary_worker = Arc::new(SummaryWorker::new(self.job_store.clone(), self.analysis_client.clone(), Arc::clone(&self.config)));
			handles.push(tokio::spawn(summary_worker.run(cancel.clone())));
		}

		let zombie_resetter = Arc::new(ZombieResetter::new(self.job_store.clone(), Arc::clone(&self.config)));
		handles.push(tokio::spawn(zombie_resetter.run(cancel.clone())));

		let webhook_timeout_poller = Arc::new(WebhookTimeoutPoller::new(self.job_store.clone(), self.transcription_client.clone(), Arc::clone(&self.meeting_context), Arc::clone(&self.config)));
		handles.push(tokio::spawn(webhook_timeout_poller.run(cancel.clone())));

		let dead_letter_reporter = Arc::new(DeadLetterReporter::new(self.job_store.clone(), Arc::clone(&self.config)));
		handles.push(tokio::spawn(dead_letter_reporter.run(cancel.clone())));

		tracing::info!(worker_count, "pipeline pool started");
		*guard = Some(RunningPool { cancel, handles });
		Ok(())
	}

	/// Signals every background task to stop and waits for them to drain.
	/// A no-op if the pool isn't running.
	pub async fn stop(&self) {
		let pool = self.running.lock().await.take();
		let Some(pool) = pool else {
			return;
		};

		pool.cancel.cancel();
		for handle in pool.handles {
			if let Err(e) = handle.await {
				tracing::error!(error = %e, "background task panicked during shutdown");
			}
		}
		tracing::info!("pipeline pool stopped");
	}

	#[must_use]
	pub async fn is_running(&self) -> bool {
		self.running.lock().await.is_some()
	}
}

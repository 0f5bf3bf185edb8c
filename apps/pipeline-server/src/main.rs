mod config;
mod telemetry;

use std::sync::Arc;

use analysis_client::AnalysisClient;
use clap::Parser;
use job_store::JobStore;
use pipeline_core::{NullMeetingContext, PoolSupervisor};
use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use transcription_client::TranscriptionClient;
use webhook_api::WebhookApiState;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenv::dotenv().ok();
	let config = ServerConfig::parse();
	telemetry::init_tracing(&config);

	config.pipeline.validate().map_err(anyhow::Error::msg)?;

	let pool = SqlitePoolOptions::new().max_connections(10).connect(&config.database_url).await?;
	let job_store = JobStore::new(pool);
	job_store.run_migrations().await?;

	let http = reqwest::Client::new();
	let transcription_client = TranscriptionClient::new(
		http.clone(),
		config.pipeline.transcription_base_url.as_str(),
		config.pipeline.transcription_api_key.as_str(),
		config.pipeline.transcription_webhook_secret.clone(),
	);
	let analysis_client = AnalysisClient::new(
		http.clone(),
		config.pipeline.llm_base_url.as_str(),
		config.pipeline.llm_api_key.as_str(),
		config.pipeline.llm_model.as_str(),
		config.pipeline.llm_temperature,
		config.pipeline.llm_max_tokens,
	);

	// No recording/room collaborator is wired up in this binary (spec §1
	// treats them as out-of-scope collaborators); a future caller that
	// owns those repositories can supply a real `MeetingContext` here.
	let meeting_context = Arc::new(NullMeetingContext);

	let pipeline_config = Arc::new(config.pipeline.clone());
	let supervisor = Arc::new(PoolSupervisor::new(job_store.clone(), transcription_client.clone(), analysis_client, Arc::clone(&meeting_context) as Arc<dyn pipeline_core::MeetingContext>, http, Arc::clone(&pipeline_config)));

	supervisor.start(pipeline_config.summary_workers).await?;

	let webhook_state = Arc::new(WebhookApiState {
		job_store,
		transcription_client,
		meeting_context: Arc::clone(&meeting_context) as Arc<dyn pipeline_core::MeetingContext>,
		default_language: pipeline_config.transcription_default_language.clone(),
		verify_signature: pipeline_config.transcription_verify_webhook,
	});

	let app = webhook_api::router(webhook_state).layer(TraceLayer::new_for_http());

	let listener = TcpListener::bind(&config.bind_addr).await?;
	tracing::info!(addr = %config.bind_addr, "pipeline server listening");

	let shutdown = CancellationToken::new();
	let shutdown_signal = shutdown.clone();
	tokio::spawn(async move {
		let _ = tokio::signal::ctrl_c().await;
		tracing::info!("received shutdown signal");
		shutdown_signal.cancel();
	});

	let server = axum::serve(listener, app);
	tokio::select! {
		result = server => {
			if let Err(e) = result {
				tracing::error!(error = %e, "webhook server error");
			}
		}
		() = shutdown.cancelled() => {
			tracing::info!("webhook server stopping");
		}
	}

	supervisor.stop().await;
	tracing::info!("pipeline server shut down cleanly");
	Ok(())
}

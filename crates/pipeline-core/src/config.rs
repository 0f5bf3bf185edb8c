use std::time::Duration;

use clap::Parser;

fn parse_duration_secs(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_secs)
}

/// Every recognized configuration option for the pipeline, following the
/// `clap::Parser` + `env` + `default_value` convention used throughout the
/// workspace (see `task_queue::config::Config`, `audio-transcriber`'s
/// `Config`).
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Meeting AI job pipeline", long_about = None)]
pub struct PipelineConfig {
	#[arg(long, env = "TRANSCRIPTION_API_KEY")]
	pub transcription_api_key: String,

	#[arg(long, env = "TRANSCRIPTION_BASE_URL", default_value = "https://api.assemblyai.com")]
	pub transcription_base_url: String,

	#[arg(long, env = "TRANSCRIPTION_WEBHOOK_SECRET")]
	pub transcription_webhook_secret: Option<String>,

	#[arg(long, env = "TRANSCRIPTION_WEBHOOK_BASE_URL")]
	pub transcription_webhook_base_url: Option<String>,

	#[arg(long, env = "TRANSCRIPTION_DEFAULT_LANGUAGE", default_value = "vi")]
	pub transcription_default_language: String,

	/// Whether webhook signatures are verified. Defaults to on; a missing
	/// secret with verification enabled is a startup configuration error.
	#[arg(long, env = "TRANSCRIPTION_VERIFY_WEBHOOK", default_value = "true")]
	pub transcription_verify_webhook: bool,

	#[arg(long, env = "LLM_API_KEY")]
	pub llm_api_key: String,

	#[arg(long, env = "LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
	pub llm_base_url: String,

	#[arg(long, env = "LLM_MODEL", default_value = "gpt-4o-mini")]
	pub llm_model: String,

	#[arg(long, env = "LLM_TEMPERATURE", default_value = "0.3")]
	pub llm_temperature: f64,

	#[arg(long, env = "LLM_MAX_TOKENS", default_value = "8000")]
	pub llm_max_tokens: u32,

	#[arg(long, env = "PIPELINE_SUMMARY_WORKERS", default_value = "2")]
	pub summary_workers: usize,

	#[arg(long, env = "PIPELINE_UPLOAD_CONCURRENCY", default_value = "2")]
	pub upload_concurrency: usize,

	#[arg(long, env = "PIPELINE_SUBMISSION_POLL_INTERVAL_SECS", default_value = "30", value_parser = parse_duration_secs)]
	pub submission_poll_interval: Duration,

	#[arg(long, env = "PIPELINE_SUMMARY_POLL_INTERVAL_SECS", default_value = "30", value_parser = parse_duration_secs)]
	pub summary_poll_interval: Duration,

	#[arg(long, env = "PIPELINE_ZOMBIE_AGE_SECS", default_value = "600", value_parser = parse_duration_secs)]
	pub zombie_age: Duration,

	#[arg(long, env = "PIPELINE_ZOMBIE_CHECK_INTERVAL_SECS", default_value = "300", value_parser = parse_duration_secs)]
	pub zombie_check_interval: Duration,

	#[arg(long, env = "PIPELINE_WEBHOOK_TIMEOUT_AGE_SECS", default_value = "600", value_parser = parse_duration_secs)]
	pub webhook_timeout_age: Duration,

	#[arg(long, env = "PIPELINE_WEBHOOK_TIMEOUT_CHECK_INTERVAL_SECS", default_value = "120", value_parser = parse_duration_secs)]
	pub webhook_timeout_check_interval: Duration,

	#[arg(long, env = "PIPELINE_DEAD_LETTER_REPORT_INTERVAL_SECS", default_value = "600", value_parser = parse_duration_secs)]
	pub dead_letter_report_interval: Duration,

	#[arg(long, env = "PIPELINE_MAX_RETRIES", default_value = "3")]
	pub max_retries: i32,

	#[arg(long, env = "PIPELINE_BACKOFF_INITIAL_SECS", default_value = "2", value_parser = parse_duration_secs)]
	pub backoff_initial: Duration,

	#[arg(long, env = "PIPELINE_BACKOFF_MAX_SECS", default_value = "10", value_parser = parse_duration_secs)]
	pub backoff_max: Duration,

	#[arg(long, env = "PIPELINE_BACKOFF_CAP_SECS", default_value = "30", value_parser = parse_duration_secs)]
	pub backoff_cap: Duration,

	#[arg(long, env = "PIPELINE_PER_JOB_TIMEOUT_SECS", default_value = "600", value_parser = parse_duration_secs)]
	pub per_job_timeout: Duration,
}

impl PipelineConfig {
	/// Non-parsing constructor for library callers assembling config
	/// programmatically rather than from argv.
	#[must_use]
	pub fn default_with_keys(transcription_api_key: impl Into<String>, llm_api_key: impl Into<String>) -> Self {
		Self {
			transcription_api_key: transcription_api_key.into(),
			transcription_base_url: "https://api.assemblyai.com".to_string(),
			transcription_webhook_secret: None,
			transcription_webhook_base_url: None,
			transcription_default_language: "vi".to_string(),
			transcription_verify_webhook: true,
			llm_api_key: llm_api_key.into(),
			llm_base_url: "https://api.openai.com/v1".to_string(),
			llm_model: "gpt-4o-mini".to_string(),
			llm_temperature: 0.3,
			llm_max_tokens: 8000,
			summary_workers: 2,
			upload_concurrency: 2,
			submission_poll_interval: Duration::from_secs(30),
			summary_poll_interval: Duration::from_secs(30),
			zombie_age: Duration::from_secs(600),
			zombie_check_interval: Duration::from_secs(300),
			webhook_timeout_age: Duration::from_secs(600),
			webhook_timeout_check_interval: Duration::from_secs(120),
			dead_letter_report_interval: Duration::from_secs(600),
			max_retries: 3,
			backoff_initial: Duration::from_secs(2),
			backoff_max: Duration::from_secs(10),
			backoff_cap: Duration::from_secs(30),
			per_job_timeout: Duration::from_secs(600),
		}
	}

	/// Startup validation: a missing webhook secret with verification
	/// enabled is a configuration error, not a silent bypass (Open Question
	/// resolution, SPEC_FULL §4).
	pub fn validate(&self) -> Result<(), String> {
		if self.transcription_verify_webhook && self.transcription_webhook_secret.is_none() {
			return Err("transcription.webhook_secret is required when transcription.verify_webhook is true".to_string());
		}
		if self.upload_concurrency == 0 {
			return Err("pipeline.upload_concurrency must be at least 1".to_string());
		}
		if self.summary_workers == 0 {
			return Err("pipeline.summary_workers must be at least 1".to_string());
		}
		Ok(())
	}

	/// Fast intervals for the test suite (teacher convention, see
	/// `task_queue::config::Config::test`).
	#[cfg(test)]
	#[must_use]
	pub fn test() -> Self {
		let mut cfg = Self::default_with_keys("test-transcription-key", "test-llm-key");
		cfg.transcription_verify_webhook = false;
		cfg.submission_poll_interval = Duration::from_millis(10);
		cfg.summary_poll_interval = Duration::from_millis(10);
		cfg.zombie_check_interval = Duration::from_millis(10);
		cfg.webhook_timeout_check_interval = Duration::from_millis(10);
		cfg.dead_letter_report_interval = Duration::from_millis(10);
		cfg.backoff_initial = Duration::from_millis(1);
		cfg.backoff_max = Duration::from_millis(5);
		cfg.backoff_cap = Duration::from_millis(20);
		cfg.per_job_timeout = Duration::from_secs(5);
		cfg
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn validate_rejects_missing_secret_when_verification_enabled() {
		let mut cfg = PipelineConfig::default_with_keys("a", "b");
		cfg.transcription_webhook_secret = None;
		cfg.transcription_verify_webhook = true;
		assert!(cfg.validate().is_err());
	}

	#[test]
	fn validate_allows_missing_secret_when_verification_disabled() {
		let mut cfg = PipelineConfig::default_with_keys("a", "b");
		cfg.transcription_webhook_secret = None;
		cfg.transcription_verify_webhook = false;
		assert!(cfg.validate().is_ok());
	}
}

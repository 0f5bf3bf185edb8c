use clap::Parser;
use pipeline_core::PipelineConfig;

/// Binary-level configuration: the pipeline's own recognized options
/// (spec §6) plus the handful of options that only make sense for the
/// process entry point — where to bind the webhook listener and which
/// database to connect to. Database connectivity setup is out of scope
/// for the core (spec §1), but the binary that wires the core together
/// still needs to know where to point `sqlx`.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Meeting AI job pipeline server", long_about = None)]
pub struct ServerConfig {
	#[command(flatten)]
	pub pipeline: PipelineConfig,

	#[arg(long, env = "DATABASE_URL", default_value = "sqlite://pipeline.db?mode=rwc")]
	pub database_url: String,

	#[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
	pub bind_addr: String,

	#[arg(long, env = "RUST_LOG", default_value = "info,sqlx=warn")]
	pub rust_log: String,

	#[arg(long, env = "LOG_JSON", default_value = "false")]
	pub log_json: bool,
}

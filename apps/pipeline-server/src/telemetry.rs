use std::str::FromStr;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::ServerConfig;

/// Structured logging setup (SPEC_FULL §1.2), mirroring `file_host`'s
/// `init_tracing`: JSON fields when `log_json` is set, pretty output
/// otherwise, both filtered by the `RUST_LOG`-style directive string.
pub fn init_tracing(config: &ServerConfig) {
	let filter = EnvFilter::from_str(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

	let registry = tracing_subscriber::registry();

	if config.log_json {
		registry
			.with(
				tracing_subscriber::fmt::layer()
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_filter(filter),
			)
			.init();
	} else {
		registry.with(tracing_subscriber::fmt::layer().event_format(tracing_subscriber::fmt::format().pretty()).with_filter(filter)).init();
	}
}

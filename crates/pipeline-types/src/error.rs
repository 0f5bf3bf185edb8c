use serde::{Deserialize, Serialize};

/// Closed taxonomy of failure kinds (spec §7). Every crate's error type
/// exposes `kind()` so the retry policy in `pipeline-core` can dispatch on
/// this without downcasting concrete error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
	/// Network-level failure talking to a provider; always retried.
	TransientNetwork,
	/// Provider responded 5xx; retried.
	Provider5xx,
	/// Provider responded 4xx (payload rejected); not retried.
	Provider4xx,
	/// Malformed inbound payload (webhook envelope); not retried.
	Protocol,
	/// Webhook signature mismatch; request rejected, no state change.
	Signature,
	/// LLM output failed to parse as the expected JSON shape; retried once.
	Parse,
	/// Transcript too short to analyze; not an error, minimal-summary path.
	Validation,
	/// Operation exceeded its deadline; retried.
	Timeout,
	/// Lost an atomic claim race; not an error, caller skips silently.
	Conflict,
	/// Invalid operation given current process/worker-pool state.
	State,
}

impl ErrorKind {
	/// Whether the retry policy (§4.1, §7) should attempt this step again.
	#[must_use]
	pub const fn is_retryable(self) -> bool {
		matches!(self, Self::TransientNetwork | Self::Provider5xx | Self::Parse | Self::Timeout)
	}
}

pub mod client;
pub mod error;
pub mod model;

pub use client::TranscriptionClient;
pub use error::{Result, TranscriptionClientError};
pub use model::{GetTranscriptResponse, ProviderStatus, ProviderUtterance, SubmitOptions, SubmitResponse, WebhookEnvelope};

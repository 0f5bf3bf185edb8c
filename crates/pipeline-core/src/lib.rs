pub mod backoff;
pub mod completion;
pub mod config;
pub mod error;
pub mod ingest;
pub mod meeting_context;
pub mod reconciliation;
pub mod submission_worker;
pub mod summary_worker;
pub mod supervisor;

pub use completion::persist_completed_transcript;
pub use config::PipelineConfig;
pub use error::{PipelineCoreError, Result};
pub use ingest::{IngestError, WebhookIngestor};
pub use meeting_context::{MeetingContext, NullMeetingContext};
pub use reconciliation::{DeadLetterReporter, WebhookTimeoutPoller, ZombieResetter};
pub use submission_worker::SubmissionWorker;
pub use summary_worker::SummaryWorker;
pub use supervisor::PoolSupervisor;

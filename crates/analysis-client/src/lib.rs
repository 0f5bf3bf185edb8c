pub mod client;
pub mod error;

pub use client::AnalysisClient;
pub use error::{AnalysisClientError, Result};

pub mod error;
pub mod model;
pub mod queries;
pub mod repository;

pub use error::{JobStoreError, Result};
pub use repository::JobStore;

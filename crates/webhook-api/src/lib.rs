pub mod error;
pub mod routes;
pub mod state;

pub use error::WebhookApiError;
pub use routes::router;
pub use state::WebhookApiState;

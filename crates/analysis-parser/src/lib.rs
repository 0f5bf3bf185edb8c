pub mod action_items;
pub mod error;
pub mod language_mix;
pub mod model;
pub mod parse;
pub mod validate;

pub use action_items::extract_action_items;
pub use error::{ParserError, Result};
pub use language_mix::detect_language_mix;
pub use model::{AnalysisResult, RawActionItem, RawDecision, RawNextStep};
pub use parse::{extract_json, parse};
pub use validate::validate_transcript_length;

use std::str::FromStr;

use pipeline_types::{ActionItem, ActionItemPriority, ActionItemStatus, ActionItemType};

use crate::error::{JobStoreError, Result};

fn parse_uuid(s: &str) -> Result<uuid::Uuid> {
	uuid::Uuid::parse_str(s).map_err(|e| JobStoreError::Decode(format!("bad uuid {s:?}: {e}")))
}

#[derive(Debug, sqlx::FromRow)]
pub struct ActionItemRow {
	pub id: String,
	pub meeting_id: String,
	pub summary_id: String,
	pub title: String,
	pub description: Option<String>,
	pub item_type: String,
	pub priority: String,
	pub status: String,
	pub transcript_reference: Option<String>,
	pub timestamp_in_meeting: Option<f64>,
}

impl ActionItemRow {
	pub fn into_action_item(self) -> Result<ActionItem> {
		let item_type = ActionItemType::from_str(&self.item_type).map_err(|e| JobStoreError::Decode(e.to_string()))?;
		let priority = ActionItemPriority::from_str(&self.priority).map_err(|e| JobStoreError::Decode(e.to_string()))?;
		let status = ActionItemStatus::from_str(&self.status).map_err(|e| JobStoreError::Decode(e.to_string()))?;

		Ok(ActionItem {
			id: parse_uuid(&self.id)?,
			meeting_id: parse_uuid(&self.meeting_id)?,
			summary_id: parse_uuid(&self.summary_id)?,
			title: self.title,
			description: self.description,
			item_type,
			priority,
			status,
			transcript_reference: self.transcript_reference,
			timestamp_in_meeting: self.timestamp_in_meeting,
		})
	}
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemType {
	Action,
	Decision,
	Question,
	FollowUp,
	Research,
}

impl ActionItemType {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Action => "action",
			Self::Decision => "decision",
			Self::Question => "question",
			Self::FollowUp => "follow_up",
			Self::Research => "research",
		}
	}
}

impl fmt::Display for ActionItemType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized action item type: {0}")]
pub struct ParseActionItemTypeError(String);

impl FromStr for ActionItemType {
	type Err = ParseActionItemTypeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"action" => Ok(Self::Action),
			"decision" => Ok(Self::Decision),
			"question" => Ok(Self::Question),
			"follow_up" => Ok(Self::FollowUp),
			"research" => Ok(Self::Research),
			other => Err(ParseActionItemTypeError(other.to_string())),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemPriority {
	Low,
	Medium,
	High,
	Urgent,
}

impl ActionItemPriority {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
			Self::Urgent => "urgent",
		}
	}
}

impl fmt::Display for ActionItemPriority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized action item priority: {0}")]
pub struct ParseActionItemPriorityError(String);

impl FromStr for ActionItemPriority {
	type Err = ParseActionItemPriorityError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"low" => Ok(Self::Low),
			"medium" => Ok(Self::Medium),
			"high" => Ok(Self::High),
			"urgent" => Ok(Self::Urgent),
			other => Err(ParseActionItemPriorityError(other.to_string())),
		}
	}
}

impl Default for ActionItemPriority {
	fn default() -> Self {
		Self::Medium
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemStatus {
	Pending,
	InProgress,
	Completed,
	Cancelled,
	Blocked,
}

impl ActionItemStatus {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::InProgress => "in_progress",
			Self::Completed => "completed",
			Self::Cancelled => "cancelled",
			Self::Blocked => "blocked",
		}
	}
}

impl fmt::Display for ActionItemStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized action item status: {0}")]
pub struct ParseActionItemStatusError(String);

impl FromStr for ActionItemStatus {
	type Err = ParseActionItemStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(Self::Pending),
			"in_progress" => Ok(Self::InProgress),
			"completed" => Ok(Self::Completed),
			"cancelled" => Ok(Self::Cancelled),
			"blocked" => Ok(Self::Blocked),
			other => Err(ParseActionItemStatusError(other.to_string())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
	pub id: uuid::Uuid,
	pub meeting_id: uuid::Uuid,
	pub summary_id: uuid::Uuid,
	pub title: String,
	pub description: Option<String>,
	pub item_type: ActionItemType,
	pub priority: ActionItemPriority,
	pub status: ActionItemStatus,
	pub transcript_reference: Option<String>,
	pub timestamp_in_meeting: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewActionItem {
	pub meeting_id: uuid::Uuid,
	pub summary_id: uuid::Uuid,
	pub title: String,
	pub description: Option<String>,
	pub item_type: ActionItemType,
	pub priority: ActionItemPriority,
	pub status: ActionItemStatus,
	pub transcript_reference: Option<String>,
	pub timestamp_in_meeting: Option<f64>,
}

use pipeline_types::{ActionItemStatus, ActionItemType, NewActionItem};

use crate::model::{AnalysisResult, RawActionItem};

fn action_item_type(raw: &RawActionItem) -> ActionItemType {
	match raw.item_type.as_deref() {
		Some("question") => ActionItemType::Question,
		Some("research") => ActionItemType::Research,
		Some("follow_up") => ActionItemType::FollowUp,
		Some("decision") => ActionItemType::Decision,
		_ => ActionItemType::Action,
	}
}

/// Derives `ActionItem` rows from an `AnalysisResult`'s three sources:
///
/// - `action_items[]` → type from source, priority from source, `pending`.
/// - `next_steps[]` → `follow_up`, priority from source, `pending`; an
///   owner/due-date note is prepended to the description when present.
/// - `decisions[]` → `decision`, `high` priority, `completed` (a decision
///   has already been made by the time it's recorded); description
///   carries owner/impact, `timestamp_in_meeting` preserved.
#[must_use]
pub fn extract_action_items(meeting_id: uuid::Uuid, summary_id: uuid::Uuid, result: &AnalysisResult) -> Vec<NewActionItem> {
	let mut items = Vec::with_capacity(result.action_items.len() + result.next_steps.len() + result.decisions.len());

	for raw in &result.action_items {
		items.push(NewActionItem {
			meeting_id,
			summary_id,
			title: raw.title.clone(),
			description: raw.description.clone(),
			item_type: action_item_type(raw),
			priority: raw.priority,
			status: ActionItemStatus::Pending,
			transcript_reference: raw.transcript_reference.clone(),
			timestamp_in_meeting: raw.timestamp,
		});
	}

	for step in &result.next_steps {
		let mut description = step.text.clone();
		let note = match (&step.owner, &step.due_date) {
			(Some(owner), Some(due)) => Some(format!("Owner: {owner}. Due: {due}.")),
			(Some(owner), None) => Some(format!("Owner: {owner}.")),
			(None, Some(due)) => Some(format!("Due: {due}.")),
			(None, None) => None,
		};
		if let Some(note) = note {
			description = format!("{note} {description}");
		}

		items.push(NewActionItem {
			meeting_id,
			summary_id,
			title: step.text.clone(),
			description: Some(description),
			item_type: ActionItemType::FollowUp,
			priority: step.priority,
			status: ActionItemStatus::Pending,
			transcript_reference: None,
			timestamp_in_meeting: None,
		});
	}

	for decision in &result.decisions {
		let mut description = decision.text.clone();
		let note = match (&decision.owner, &decision.impact) {
			(Some(owner), Some(impact)) => Some(format!("Owner: {owner}. Impact: {impact}.")),
			(Some(owner), None) => Some(format!("Owner: {owner}.")),
			(None, Some(impact)) => Some(format!("Impact: {impact}.")),
			(None, None) => None,
		};
		if let Some(note) = note {
			description = format!("{note} {description}");
		}

		items.push(NewActionItem {
			meeting_id,
			summary_id,
			title: decision.text.clone(),
			description: Some(description),
			item_type: ActionItemType::Decision,
			priority: pipeline_types::ActionItemPriority::High,
			status: ActionItemStatus::Completed,
			transcript_reference: None,
			timestamp_in_meeting: decision.timestamp,
		});
	}

	items
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{RawActionItem, RawDecision, RawNextStep};
	use pipeline_types::ActionItemPriority;

	fn ids() -> (uuid::Uuid, uuid::Uuid) {
		(uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
	}

	#[test]
	fn action_items_become_pending() {
		let (meeting_id, summary_id) = ids();
		let result = AnalysisResult {
			executive_summary: "X".to_string(),
			key_points: vec![],
			decisions: vec![],
			topics: vec![],
			open_questions: vec![],
			next_steps: vec![],
			action_items: vec![RawActionItem {
				title: "Follow up with vendor".to_string(),
				description: None,
				item_type: Some("research".to_string()),
				priority: ActionItemPriority::High,
				transcript_reference: Some("00:12:30".to_string()),
				timestamp: Some(750.0),
			}],
			overall_sentiment: None,
			sentiment_breakdown: std::collections::HashMap::new(),
			total_speaking_time: None,
			participant_balance: None,
			engagement_score: None,
		};

		let items = extract_action_items(meeting_id, summary_id, &result);
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].item_type, ActionItemType::Research);
		assert_eq!(items[0].status, ActionItemStatus::Pending);
		assert_eq!(items[0].priority, ActionItemPriority::High);
	}

	#[test]
	fn next_steps_become_follow_up_with_owner_note() {
		let (meeting_id, summary_id) = ids();
		let result = AnalysisResult {
			executive_summary: "X".to_string(),
			key_points: vec![],
			decisions: vec![],
			topics: vec![],
			open_questions: vec![],
			next_steps: vec![RawNextStep { text: "Ship the report".to_string(), owner: Some("Alice".to_string()), due_date: Some("2026-08-01".to_string()), priority: ActionItemPriority::Medium }],
			action_items: vec![],
			overall_sentiment: None,
			sentiment_breakdown: std::collections::HashMap::new(),
			total_speaking_time: None,
			participant_balance: None,
			engagement_score: None,
		};

		let items = extract_action_items(meeting_id, summary_id, &result);
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].item_type, ActionItemType::FollowUp);
		assert_eq!(items[0].status, ActionItemStatus::Pending);
		assert!(items[0].description.as_ref().unwrap().starts_with("Owner: Alice. Due: 2026-08-01."));
	}

	#[test]
	fn decisions_become_completed_high_priority() {
		let (meeting_id, summary_id) = ids();
		let result = AnalysisResult {
			executive_summary: "X".to_string(),
			key_points: vec![],
			decisions: vec![RawDecision { text: "Adopt the new vendor".to_string(), owner: Some("Bob".to_string()), impact: Some("cost reduction".to_string()), timestamp: Some(120.0) }],
			topics: vec![],
			open_questions: vec![],
			next_steps: vec![],
			action_items: vec![],
			overall_sentiment: None,
			sentiment_breakdown: std::collections::HashMap::new(),
			total_speaking_time: None,
			participant_balance: None,
			engagement_score: None,
		};

		let items = extract_action_items(meeting_id, summary_id, &result);
		assert_eq!(items.len(), 1);
		assert_eq!(items[0].item_type, ActionItemType::Decision);
		assert_eq!(items[0].status, ActionItemStatus::Completed);
		assert_eq!(items[0].priority, ActionItemPriority::High);
		assert_eq!(items[0].timestamp_in_meeting, Some(120.0));
	}
}

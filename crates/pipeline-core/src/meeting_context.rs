use async_trait::async_trait;

/// Narrow interface to the recording/room lifecycle collaborators: a
/// completed transcript gets tagged with the most recent recording for its
/// meeting, and the room it took place in, when either is known. The
/// pipeline only ever needs these two lookups, so it depends on this trait
/// rather than the full recording/room repositories.
#[async_trait]
pub trait MeetingContext: Send + Sync {
	async fn recent_recording_id(&self, meeting_id: uuid::Uuid) -> Option<uuid::Uuid>;
	async fn room_id(&self, meeting_id: uuid::Uuid) -> Option<uuid::Uuid>;
}

/// Used when no recording/room collaborator is wired up (library callers,
/// tests). Both lookups degrade to `None`, which `Transcript` already
/// models `recording_id` / `room_id` as optional.
pub struct NullMeetingContext;

#[async_trait]
impl MeetingContext for NullMeetingContext {
	async fn recent_recording_id(&self, _meeting_id: uuid::Uuid) -> Option<uuid::Uuid> {
		None
	}

	async fn room_id(&self, _meeting_id: uuid::Uuid) -> Option<uuid::Uuid> {
		None
	}
}

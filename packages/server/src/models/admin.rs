use serde::Serialize;

/// Row counts removed by a purge.
#[derive(Serialize, utoipa::ToSchema, Default)]
pub struct PurgeResponse {
    pub attendance_records: u64,
    pub attendance_sessions: u64,
    pub submissions: u64,
    pub assignments: u64,
    pub announcements: u64,
    /// Stored documents that could not be removed from disk.
    pub orphaned_documents: u64,
}

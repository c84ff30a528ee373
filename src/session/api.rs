use async_trait::async_trait;

use crate::{
    record::{FinancialRecord, NewRecord, RecordId, RecordPatch, UserId},
    session::SessionError,
};

/// The CRUD operations of the record store, as seen by a client.
///
/// Implementations make a single attempt per call and report failures as a
/// [SessionError]; they never touch a session's cache.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Get every record owned by `user_id`, in creation order.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<FinancialRecord>, SessionError>;

    /// Store a new record and return it with its assigned ID.
    async fn create(&self, record: &NewRecord) -> Result<FinancialRecord, SessionError>;

    /// Merge `patch` into the record `id` and return the updated record.
    async fn update(
        &self,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<FinancialRecord, SessionError>;

    /// Permanently delete the record `id` and return what was deleted.
    async fn delete(&self, id: &RecordId) -> Result<FinancialRecord, SessionError>;
}

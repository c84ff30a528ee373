use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::{
    AppState,
    record::{
        FinancialRecord, NewRecord, RecordId, RecordPatch, RecordState, UserId, create_record,
        delete_record, get_records_by_user, update_record,
    },
    session::{RecordApi, SessionError},
};

/// A [RecordApi] that runs against a database connection in the same
/// process, with the same validation as the HTTP endpoints.
///
/// Useful for embedding the store in a single binary and for tests.
#[derive(Debug, Clone)]
pub struct LocalRecordApi {
    state: RecordState,
}

impl LocalRecordApi {
    /// Create an API over an initialized database connection.
    pub fn new(db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            state: RecordState { db_connection },
        }
    }
}

impl From<&AppState> for LocalRecordApi {
    fn from(state: &AppState) -> Self {
        Self::new(state.db_connection.clone())
    }
}

#[async_trait]
impl RecordApi for LocalRecordApi {
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<FinancialRecord>, SessionError> {
        self.state
            .with_connection(|connection| get_records_by_user(user_id, connection))
            .map_err(SessionError::from)
    }

    async fn create(&self, record: &NewRecord) -> Result<FinancialRecord, SessionError> {
        let record = record.clone().validate()?;

        self.state
            .with_connection(|connection| create_record(&record, connection))
            .map_err(SessionError::from)
    }

    async fn update(
        &self,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<FinancialRecord, SessionError> {
        let patch = patch.clone().validate()?;

        self.state
            .with_connection(|connection| update_record(id, &patch, connection))
            .map_err(SessionError::from)
    }

    async fn delete(&self, id: &RecordId) -> Result<FinancialRecord, SessionError> {
        self.state
            .with_connection(|connection| delete_record(id, connection))
            .map_err(SessionError::from)
    }
}

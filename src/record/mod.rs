//! Financial records and the store API that manages them.
//!
//! This module contains everything the record store server needs:
//! - The [FinancialRecord] model and the request types for creating and
//!   updating records, with their validation rules
//! - Database functions for storing, querying, and deleting records
//! - The JSON route handlers for the CRUD endpoints

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{AppState, Error};

mod create;
mod db;
mod delete;
mod domain;
mod list;
mod update;

pub use create::create_record_endpoint;
pub use db::{
    create_record, create_record_table, delete_record, get_record, get_records_by_user,
    map_record_row, update_record,
};
pub use delete::delete_record_endpoint;
pub use domain::{
    Category, FinancialRecord, NewRecord, PaymentMethod, RecordDraft, RecordField, RecordId,
    RecordPatch, UserId,
};
pub use list::list_records_endpoint;
pub use update::update_record_endpoint;

/// The state shared by the record route handlers.
#[derive(Debug, Clone)]
pub struct RecordState {
    /// The database connection for managing records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RecordState {
    /// Run `query` with exclusive access to the database connection.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the lock is poisoned, otherwise
    /// whatever `query` returns.
    pub fn with_connection<T>(
        &self,
        query: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let connection = self
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        query(&connection)
    }
}

impl FromRef<AppState> for RecordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::{
    Error,
    record::{FinancialRecord, NewRecord, RecordState, create_record},
};

/// A route handler for creating a new record, responds with the stored
/// record including its new ID.
///
/// Bodies with missing or mistyped fields are rejected with `400 Bad
/// Request`.
pub async fn create_record_endpoint(
    State(state): State<RecordState>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<Json<FinancialRecord>, Error> {
    let Json(new_record) = payload?;
    let new_record = new_record.validate()?;

    let record = state.with_connection(|connection| create_record(&new_record, connection))?;

    tracing::info!("Created record {} for user {}", record.id, record.user_id);

    Ok(Json(record))
}

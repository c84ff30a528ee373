use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    record::{FinancialRecord, RecordId, RecordState, delete_record},
};

/// A route handler for permanently deleting a record, responds with the
/// deleted record.
///
/// Responds with `404 Not Found` if the record does not exist, e.g. because
/// it was already deleted.
pub async fn delete_record_endpoint(
    State(state): State<RecordState>,
    Path(record_id): Path<String>,
) -> Result<Json<FinancialRecord>, Error> {
    let record_id = RecordId::new(record_id);
    let record = state.with_connection(|connection| delete_record(&record_id, connection))?;

    tracing::info!("Deleted record {}", record.id);

    Ok(Json(record))
}

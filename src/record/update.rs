use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    Error,
    record::{FinancialRecord, RecordId, RecordPatch, RecordState, update_record},
};

/// A route handler for partially updating a record, responds with the
/// updated record.
///
/// Only the fields present in the body are changed. Responds with `404 Not
/// Found` if the record does not exist.
pub async fn update_record_endpoint(
    State(state): State<RecordState>,
    Path(record_id): Path<String>,
    payload: Result<Json<RecordPatch>, JsonRejection>,
) -> Result<Json<FinancialRecord>, Error> {
    let Json(patch) = payload?;
    let patch = patch.validate()?;
    let record_id = RecordId::new(record_id);

    let record = state
        .with_connection(|connection| update_record(&record_id, &patch, connection))
        .inspect_err(|error| {
            if *error == Error::NotFound {
                tracing::debug!("Tried to update missing record {record_id}");
            }
        })?;

    tracing::info!("Updated record {}", record.id);

    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        build_router,
        endpoints::{self, format_endpoint},
        record::{Category, FinancialRecord, create_record, get_record},
        test_utils::{get_test_app_state, new_record},
    };

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let state = get_test_app_state();
        let record = {
            let conn = state.db_connection.lock().unwrap();
            let mut rent = new_record("u1", "Rent", 5.0);
            rent.category = Category::Rent;
            create_record(&rent, &conn).unwrap()
        };
        let server =
            TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

        let response = server
            .put(&format_endpoint(endpoints::RECORD, record.id.as_str()))
            .json(&json!({ "amount": 10 }))
            .await;

        response.assert_status_ok();
        let updated = response.json::<FinancialRecord>();
        assert_eq!(updated.amount, 10.0);
        assert_eq!(updated.category, Category::Rent);
        assert_eq!(updated.description, "Rent");
        let stored = get_record(&record.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn full_record_body_cannot_change_owner_or_date() {
        let state = get_test_app_state();
        let record = {
            let conn = state.db_connection.lock().unwrap();
            create_record(&new_record("u1", "Coffee", 4.5), &conn).unwrap()
        };
        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        let response = server
            .put(&format_endpoint(endpoints::RECORD, record.id.as_str()))
            .json(&json!({
                "_id": "something-else",
                "userId": "u2",
                "date": "1999-01-01T00:00:00Z",
                "description": "Tea",
                "amount": 4.5,
                "category": "Food",
                "paymentMethod": "Cash",
            }))
            .await;

        response.assert_status_ok();
        let updated = response.json::<FinancialRecord>();
        assert_eq!(updated.description, "Tea");
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.user_id, record.user_id);
        assert_eq!(updated.date, record.date);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let server = TestServer::try_new(build_router(get_test_app_state()))
            .expect("Could not create test server.");

        let response = server
            .put(&format_endpoint(endpoints::RECORD, "does-not-exist"))
            .json(&json!({ "amount": 10 }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mistyped_amount_is_a_validation_error() {
        let state = get_test_app_state();
        let record = {
            let conn = state.db_connection.lock().unwrap();
            create_record(&new_record("u1", "Coffee", 4.5), &conn).unwrap()
        };
        let server =
            TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

        let response = server
            .put(&format_endpoint(endpoints::RECORD, record.id.as_str()))
            .json(&json!({ "amount": "ten" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let stored = get_record(&record.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(stored, record);
    }
}

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    record::{FinancialRecord, RecordState, UserId, get_records_by_user},
};

/// A route handler for listing a user's records in creation order.
///
/// A user without records gets `200 OK` with an empty array.
pub async fn list_records_endpoint(
    State(state): State<RecordState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<FinancialRecord>>, Error> {
    let user_id = UserId::new(&user_id)?;
    let records = state.with_connection(|connection| get_records_by_user(&user_id, connection))?;

    tracing::debug!("Found {} records for user {user_id}", records.len());

    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use crate::{
        build_router,
        endpoints::{self, format_endpoint},
        record::{FinancialRecord, create_record},
        test_utils::{get_test_app_state, new_record},
    };

    #[tokio::test]
    async fn lists_only_the_users_records() {
        let state = get_test_app_state();
        let (first, second) = {
            let conn = state.db_connection.lock().unwrap();
            let first = create_record(&new_record("u1", "Coffee", 4.5), &conn).unwrap();
            create_record(&new_record("u2", "Not mine", 99.0), &conn).unwrap();
            let second = create_record(&new_record("u1", "Salary", 100.0), &conn).unwrap();
            (first, second)
        };
        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        let response = server
            .get(&format_endpoint(endpoints::RECORDS_BY_USER, "u1"))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<FinancialRecord>>(), vec![first, second]);
    }

    #[tokio::test]
    async fn user_without_records_gets_empty_list() {
        let server = TestServer::try_new(build_router(get_test_app_state()))
            .expect("Could not create test server.");

        let response = server
            .get(&format_endpoint(endpoints::RECORDS_BY_USER, "nobody"))
            .await;

        response.assert_status_ok();
        assert!(response.json::<Vec<FinancialRecord>>().is_empty());
    }

    #[tokio::test]
    async fn blank_user_id_is_rejected() {
        let server = TestServer::try_new(build_router(get_test_app_state()))
            .expect("Could not create test server.");

        let response = server
            .get(&format_endpoint(endpoints::RECORDS_BY_USER, " "))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn padded_user_id_is_a_different_user() {
        let state = get_test_app_state();
        {
            let conn = state.db_connection.lock().unwrap();
            create_record(&new_record("u1", "Coffee", 4.5), &conn).unwrap();
        }
        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        let response = server
            .get(&format_endpoint(endpoints::RECORDS_BY_USER, " u1"))
            .await;

        response.assert_status_ok();
        assert!(response.json::<Vec<FinancialRecord>>().is_empty());
    }
}

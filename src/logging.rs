//! Middleware for logging requests and responses.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{StatusCode, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde_json::json;

use crate::Error;

/// The number of bytes of a request or response body that are logged at the
/// `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body, in bytes, that is read. Larger requests are
/// rejected with `413 Payload Too Large` before they reach a handler.
pub const REQUEST_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Bodies are logged as lossy UTF-8 text, but handlers and clients receive
/// the original bytes.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, REQUEST_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(error) => return reject_request_body(error),
    };
    log_request(&parts, &String::from_utf8_lossy(&body_bytes));

    let response = next.run(Request::from_parts(parts, Body::from(body_bytes))).await;

    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body_bytes) => {
            log_response(&parts, &String::from_utf8_lossy(&body_bytes));
            Response::from_parts(parts, Body::from(body_bytes))
        }
        Err(error) => {
            tracing::error!("Could not read the response body: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn reject_request_body(error: axum::Error) -> Response {
    let error = error.into_inner();

    if error.is::<LengthLimitError>() {
        tracing::debug!("Rejected a request body over {REQUEST_BODY_LIMIT} bytes");
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({
                "error": format!("request body must not be larger than {REQUEST_BODY_LIMIT} bytes")
            })),
        )
            .into_response();
    }

    Error::Validation(format!("could not read the request body: {error}")).into_response()
}

fn truncate(body: &str) -> &str {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return body;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Bytes,
        http::StatusCode,
        middleware,
        routing::post,
    };
    use axum_test::TestServer;

    use crate::{
        build_router, endpoints,
        record::{UserId, get_records_by_user},
        test_utils::{ErrorBody, get_test_app_state},
    };

    use super::{LOG_BODY_LENGTH_LIMIT, REQUEST_BODY_LIMIT, logging_middleware, truncate};

    fn logged_record_server() -> (TestServer, crate::AppState) {
        let state = get_test_app_state();
        let app = build_router(state.clone()).layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        (server, state)
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate(&body);

        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT);
        assert!(body.starts_with(truncated));
    }

    #[test]
    fn short_bodies_are_not_truncated() {
        assert_eq!(truncate("{}"), "{}");
    }

    #[tokio::test]
    async fn passes_bodies_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = "x".repeat(LOG_BODY_LENGTH_LIMIT * 2);

        let response = server.post("/echo").text(body.clone()).await;

        response.assert_status_ok();
        response.assert_text(body);
    }

    #[tokio::test]
    async fn passes_binary_bodies_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: Bytes| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = Bytes::from_static(b"caf\xff\x00\xc3");

        let response = server.post("/echo").bytes(body.clone()).await;

        response.assert_status_ok();
        assert_eq!(response.as_bytes(), &body);
    }

    #[tokio::test]
    async fn create_with_invalid_utf8_is_rejected() {
        let (server, state) = logged_record_server();
        let mut body = br#"{"userId":"u1","date":"2024-05-01T08:00:00Z","description":"caf"#.to_vec();
        body.push(0xff);
        body.extend_from_slice(br#"","amount":4.5,"category":"Food","paymentMethod":"Cash"}"#);

        let response = server
            .post(endpoints::RECORDS)
            .content_type("application/json")
            .bytes(Bytes::from(body))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(!response.json::<ErrorBody>().error.is_empty());
        let stored = {
            let conn = state.db_connection.lock().unwrap();
            get_records_by_user(&UserId::new("u1").unwrap(), &conn).unwrap()
        };
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn oversized_request_body_is_rejected() {
        let (server, _) = logged_record_server();
        let body = vec![b' '; REQUEST_BODY_LIMIT + 1];

        let response = server
            .post(endpoints::RECORDS)
            .content_type("application/json")
            .bytes(Bytes::from(body))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response.json::<ErrorBody>().error.contains("larger than"));
    }
}

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{
    Method, Request, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    endpoints::{self, format_endpoint},
    record::{FinancialRecord, NewRecord, RecordId, RecordPatch, UserId},
    session::{RecordApi, SessionError},
};

/// How long a request may take, including reading the response body, before
/// it is reported as a [SessionError::Transport].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A [RecordApi] that talks JSON to a record store server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRecordApi {
    base_url: String,
    timeout: Duration,
    client: Client<HttpConnector, Full<Bytes>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpRecordApi {
    /// Create a client for the server at `base_url`, e.g.
    /// "http://127.0.0.1:3001".
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout: DEFAULT_TIMEOUT,
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    /// Replace the [DEFAULT_TIMEOUT].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<T, SessionError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = Request::builder()
            .method(method.clone())
            .uri(&url)
            .header(ACCEPT, "application/json");

        let body = match body {
            Some(body) => {
                request = request.header(CONTENT_TYPE, "application/json");
                let bytes = serde_json::to_vec(body)
                    .map_err(|e| SessionError::Validation(e.to_string()))?;
                Full::new(Bytes::from(bytes))
            }
            None => Full::new(Bytes::new()),
        };

        let request = request
            .body(body)
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        tracing::debug!("Sending {method} {url}");

        let (status, body) = tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| {
                SessionError::Transport(format!(
                    "{method} {url} timed out after {:?}",
                    self.timeout
                ))
            })??;

        tracing::debug!("{method} {url} responded with {status}");

        match status {
            status if status.is_success() => serde_json::from_slice(&body).map_err(|e| {
                SessionError::Server(format!("could not decode the response: {e}"))
            }),
            StatusCode::NOT_FOUND => Err(SessionError::NotFound),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(SessionError::Validation(error_message(status, &body)))
            }
            status => Err(SessionError::Server(error_message(status, &body))),
        }
    }

    async fn exchange(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<(StatusCode, Bytes), SessionError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?
            .to_bytes();

        Ok((status, body))
    }
}

/// Pull the message out of an `{"error": "..."}` body, falling back to the
/// raw text and then to the status itself.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(ErrorBody { error }) = serde_json::from_slice::<ErrorBody>(body) {
        return error;
    }

    let text = String::from_utf8_lossy(body).trim().to_owned();
    if text.is_empty() {
        status.to_string()
    } else {
        text
    }
}

#[async_trait]
impl RecordApi for HttpRecordApi {
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<FinancialRecord>, SessionError> {
        let path = format_endpoint(endpoints::RECORDS_BY_USER, user_id.as_str());

        self.send(Method::GET, &path, None::<&()>).await
    }

    async fn create(&self, record: &NewRecord) -> Result<FinancialRecord, SessionError> {
        self.send(Method::POST, endpoints::RECORDS, Some(record))
            .await
    }

    async fn update(
        &self,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<FinancialRecord, SessionError> {
        let path = format_endpoint(endpoints::RECORD, id.as_str());

        self.send(Method::PUT, &path, Some(patch)).await
    }

    async fn delete(&self, id: &RecordId) -> Result<FinancialRecord, SessionError> {
        let path = format_endpoint(endpoints::RECORD, id.as_str());

        self.send(Method::DELETE, &path, None::<&()>).await
    }
}

//! HTTP client wrapper - runs the auth exchange and the main exchange

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::Duration;

use crate::auth::{AuthResponse, Authentication};
use crate::collection::RequestItem;
use crate::error::{AuthError, ExchangeError};
use crate::models::HttpResult;

/// Create an HTTP client with the given transport timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Build the main request's headers, letting the body's content type win
fn build_headers(request: &RequestItem) -> Result<HeaderMap, ExchangeError> {
    let mut headers = HeaderMap::new();
    for (key, values) in &request.headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ExchangeError::Validation(format!("header '{}': {}", key, e)))?;
        for value in values {
            let value = HeaderValue::from_str(value)
                .map_err(|e| ExchangeError::Validation(format!("header '{}': {}", key, e)))?;
            headers.append(name.clone(), value);
        }
    }

    if let Some(body) = &request.body {
        if !body.content_type.is_empty() {
            let value = HeaderValue::from_str(&body.content_type)
                .map_err(|e| ExchangeError::Validation(format!("content type: {}", e)))?;
            headers.insert(CONTENT_TYPE, value);
        }
    }

    Ok(headers)
}

/// Run the auxiliary exchange an authentication scheme asks for, if any
pub async fn authenticate(
    client: &reqwest::Client,
    authentication: &Authentication,
) -> Result<Option<AuthResponse>, AuthError> {
    let Some(builder) = authentication.prepare(client) else {
        return Ok(None);
    };

    tracing::debug!(kind = authentication.type_name(), "Running auth exchange");
    let response = builder
        .send()
        .await
        .map_err(|e| AuthError::TokenRequest(e.to_string()))?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| AuthError::TokenRequest(e.to_string()))?;

    Ok(Some(AuthResponse {
        status,
        body: body.to_vec(),
    }))
}

/// Execute the full exchange for a request: optional auth, then the main
/// request, then the body. Errors are captured in the returned result.
pub async fn execute_exchange(
    client: &reqwest::Client,
    request: &RequestItem,
    started_at: DateTime<Utc>,
) -> HttpResult {
    let url = match reqwest::Url::parse(&request.url) {
        Ok(url) => url,
        Err(e) => {
            let err = ExchangeError::Validation(format!("malformed URL '{}': {}", request.url, e));
            return HttpResult::failed(started_at, err);
        }
    };
    let mut headers = match build_headers(request) {
        Ok(headers) => headers,
        Err(err) => return HttpResult::failed(started_at, err),
    };

    if !request.authentication.is_none() {
        let applied = match authenticate(client, &request.authentication).await {
            Ok(response) => request.authentication.apply(&mut headers, response.as_ref()),
            Err(e) => Err(e),
        };
        if let Err(e) = applied {
            return HttpResult::failed(started_at, e.into());
        }
    }

    let mut builder = client
        .request(request.method.to_reqwest(), url)
        .headers(headers);
    if let Some(body) = &request.body {
        builder = builder.body(body.payload.clone());
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => return HttpResult::failed(started_at, ExchangeError::transport(e)),
    };

    let status = response.status();
    let headers = response.headers().clone();
    let (payload, payload_error) = match response.bytes().await {
        Ok(bytes) => (bytes.to_vec(), None),
        Err(e) => (Vec::new(), Some(ExchangeError::transport(e))),
    };

    HttpResult {
        status: Some(status),
        headers,
        payload,
        payload_error,
        error: None,
        started_at,
        finished_at: Utc::now(),
    }
}

//! Deadline-bounded JSON HTTP calls between DGC services (spec §5:
//! "every outbound HTTP call uses a bounded deadline... 5 s for primary
//! coordination, 3 s for best-effort fan-out"). Outbound calls stamp
//! `x-service-token` per spec §4.I: "Outbound inter-service requests add
//! this header."

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// 5-second deadline for primary-path collaborator calls (e.g. marketplace
/// consulting the certificate authority or reconciliation).
pub const PRIMARY_DEADLINE: Duration = Duration::from_secs(5);

/// 3-second deadline for best-effort fan-out (e.g. posting to the risk
/// engine) whose failure must stay silent to the caller.
pub const BEST_EFFORT_DEADLINE: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("collaborator call timed out after the configured deadline")]
    Timeout,
    #[error("collaborator unreachable: {0}")]
    Unreachable(String),
    #[error("collaborator returned an unparsable response: {0}")]
    InvalidResponse(String),
}

pub struct CallResponse {
    pub status: u16,
    pub body: Value,
}

impl CallResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
    service_token: Option<String>,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>, service_token: Option<String>) -> Self {
        ServiceClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_token,
        }
    }

    fn join(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
        deadline: Duration,
    ) -> Result<CallResponse, ClientError> {
        let url = self.join(path);
        let mut req = self.http.request(method, &url);
        if let Some(token) = &self.service_token {
            req = req.header("x-service-token", token);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let send = req.send();
        let response = match tokio::time::timeout(deadline, send).await {
            Err(_) => return Err(ClientError::Timeout),
            Ok(Err(e)) => return Err(ClientError::Unreachable(e.to_string())),
            Ok(Ok(resp)) => resp,
        };
        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Ok(CallResponse { status, body })
    }

    pub async fn get(&self, path: &str, deadline: Duration) -> Result<CallResponse, ClientError> {
        self.call(reqwest::Method::GET, path, None, deadline).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        deadline: Duration,
    ) -> Result<CallResponse, ClientError> {
        self.call(reqwest::Method::POST, path, Some(body), deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ServiceClient::new("http://localhost:9000/", None);
        assert_eq!(client.join("/health"), "http://localhost:9000/health");
    }

    #[tokio::test]
    async fn unreachable_host_yields_unreachable_error() {
        let client = ServiceClient::new("http://127.0.0.1:1", None);
        let result = client.get("/health", Duration::from_millis(500)).await;
        assert!(matches!(
            result,
            Err(ClientError::Unreachable(_)) | Err(ClientError::Timeout)
        ));
    }
}

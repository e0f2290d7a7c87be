//! Appliance management REST client
//!
//! One request per call. No retries, no backoff: a failed call is returned
//! to the handler unchanged.

use std::time::Duration;

use log::{debug, info};
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::ProviderConfig;

/// Upload chunk size accepted by the file-transfer endpoint
const UPLOAD_CHUNK_SIZE: usize = 512 * 1024;

const AUTH_TOKEN_HEADER: &str = "X-F5-Auth-Token";

/// Errors returned by the appliance client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {path} returned {status}: {message}")]
    Status {
        method: String,
        path: String,
        status: u16,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid provider configuration: {0}")]
    Config(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Client for the appliance management API
pub struct ApplianceClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token_auth: bool,
    login_ref: String,
    token: RwLock<Option<String>>,
    poll_interval: Duration,
}

impl ApplianceClient {
    pub fn new(config: &ProviderConfig) -> ClientResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            token_auth: config.token_auth,
            login_ref: config.login_ref.clone(),
            token: RwLock::new(None),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Interval between polls of long-running appliance tasks
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Current auth token, logging in on first use
    async fn auth_token(&self) -> ClientResult<Option<String>> {
        if !self.token_auth {
            return Ok(None);
        }
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(Some(token.clone()));
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            return Ok(Some(token.clone()));
        }
        let token = self.login().await?;
        *guard = Some(token.clone());
        Ok(Some(token))
    }

    async fn login(&self) -> ClientResult<String> {
        info!("Logging in to {} as {}", self.base_url, self.username);

        let body = serde_json::json!({
            "username": self.username,
            "password": self.password,
            "loginProviderName": self.login_ref,
        });
        let response = self
            .http
            .post(format!("{}/mgmt/shared/authn/login", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Auth(error_message(status, &text)));
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        json.get("token")
            .and_then(|t| t.get("token"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| ClientError::Auth("login response carries no token".to_string()))
    }

    async fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let request = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        Ok(match self.auth_token().await? {
            Some(token) => request.header(AUTH_TOKEN_HEADER, token),
            None => request.basic_auth(&self.username, Some(&self.password)),
        })
    }

    async fn execute(
        &self,
        method: &Method,
        path: &str,
        request: RequestBuilder,
    ) -> ClientResult<(StatusCode, String)> {
        debug!("{} {}", method, path);
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("{} {} -> {}", method, path, status);

        if status == StatusCode::UNAUTHORIZED {
            // Token expired or revoked; the next call logs in again
            *self.token.write().await = None;
        }
        Ok((status, text))
    }

    // =========================================================================
    // REST verbs
    // =========================================================================

    /// GET a resource; `None` when the appliance reports it absent
    pub async fn get(&self, path: &str) -> ClientResult<Option<serde_json::Value>> {
        self.get_with_query(path, &[]).await
    }

    /// GET with query parameters (e.g., `$filter`)
    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<Option<serde_json::Value>> {
        let mut request = self.request(Method::GET, path).await?;
        if !query.is_empty() {
            request = request.query(query);
        }
        let (status, text) = self.execute(&Method::GET, path, request).await?;

        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        check_status(&Method::GET, path, status, &text)?;
        parse_body(&text).map(Some)
    }

    pub async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: &serde_json::Value) -> ClientResult<serde_json::Value> {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        self.send_json(Method::PATCH, path, body).await
    }

    /// PATCH every member of a collection matched by a query (e.g., `$filter`)
    pub async fn patch_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        let request = self
            .request(Method::PATCH, path)
            .await?
            .query(query)
            .json(body);
        let (status, text) = self.execute(&Method::PATCH, path, request).await?;
        check_status(&Method::PATCH, path, status, &text)?;
        parse_body(&text)
    }

    /// DELETE a resource; an already absent resource is not an error
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let request = self.request(Method::DELETE, path).await?;
        let (status, text) = self.execute(&Method::DELETE, path, request).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(&Method::DELETE, path, status, &text)
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        let request = self.request(method.clone(), path).await?.json(body);
        let (status, text) = self.execute(&method, path, request).await?;
        check_status(&method, path, status, &text)?;
        parse_body(&text)
    }

    /// Upload a file to the appliance download directory
    /// (`/var/config/rest/downloads/<file_name>`) in ranged chunks
    pub async fn upload(&self, file_name: &str, content: &[u8]) -> ClientResult<()> {
        if content.is_empty() {
            return Err(ClientError::Config(format!(
                "refusing to upload empty file {}",
                file_name
            )));
        }

        let path = format!("/mgmt/shared/file-transfer/uploads/{}", file_name);
        let total = content.len();
        let mut start = 0;
        while start < total {
            let end = (start + UPLOAD_CHUNK_SIZE).min(total);
            let request = self
                .request(Method::POST, &path)
                .await?
                .header(CONTENT_TYPE, "application/octet-stream")
                .header(CONTENT_RANGE, format!("{}-{}/{}", start, end - 1, total))
                .body(content[start..end].to_vec());
            let (status, text) = self.execute(&Method::POST, &path, request).await?;
            check_status(&Method::POST, &path, status, &text)?;
            start = end;
        }
        Ok(())
    }
}

/// Local path of a file uploaded with [`ApplianceClient::upload`]
pub fn uploaded_file_path(file_name: &str) -> String {
    format!("/var/config/rest/downloads/{}", file_name)
}

fn check_status(method: &Method, path: &str, status: StatusCode, text: &str) -> ClientResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status {
            method: method.to_string(),
            path: path.to_string(),
            status: status.as_u16(),
            message: error_message(status, text),
        })
    }
}

fn parse_body(text: &str) -> ClientResult<serde_json::Value> {
    if text.trim().is_empty() {
        Ok(serde_json::Value::Null)
    } else {
        Ok(serde_json::from_str(text)?)
    }
}

/// The appliance reports errors as `{"code": 400, "message": "..."}`
fn error_message(status: StatusCode, text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_appliance_message() {
        let text = r#"{"code": 409, "message": "01020066:3: The requested Pool (/Common/web) already exists"}"#;
        assert_eq!(
            error_message(StatusCode::CONFLICT, text),
            "01020066:3: The requested Pool (/Common/web) already exists"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
    }

    #[test]
    fn empty_body_is_null() {
        assert_eq!(parse_body("  ").unwrap(), serde_json::Value::Null);
        assert!(matches!(parse_body("{oops"), Err(ClientError::Decode(_))));
    }

    #[test]
    fn new_rejects_incomplete_config() {
        let err = ApplianceClient::new(&ProviderConfig::default()).err().unwrap();
        assert!(matches!(err, ClientError::Config(_)));
    }
}

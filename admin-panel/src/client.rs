use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{AdminError, Result};
use crate::record::Record;
use crate::session::TokenSource;

// Every payload the backend returns is wrapped in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Option::default")]
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// REST client for the admin backend.
#[derive(Clone)]
pub struct AdminHttpClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl AdminHttpClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenSource> {
        &self.tokens
    }

    /// `<base>/<resource>[/<id>]`. The id is always one percent-encoded segment.
    fn url(&self, resource: &str, id: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AdminError::Config(format!("Invalid server URL {}: {}", self.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AdminError::Config(format!("Server URL {} cannot take a path", self.base_url)))?;
            segments
                .pop_if_empty()
                .extend(resource.split('/').filter(|s| !s.is_empty()));
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Exchange credentials for a bearer token and store it.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let url = self.url("auth/login", None)?;
        info!("🔐 Logging in as {} at {}", email, url);

        let response = self
            .client
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let envelope: DataEnvelope<LoginData> = decode(response).await?;
        let token = envelope
            .data
            .map(|d| d.token)
            .ok_or_else(|| AdminError::Server {
                status: StatusCode::OK.as_u16(),
                message: Some("Login response did not contain a token".to_string()),
            })?;

        self.tokens.store_server_url(self.base_url.clone());
        self.tokens.store_token(token.clone());
        info!("✅ Logged in");
        Ok(token)
    }

    /// Raw route list from the discovery endpoint.
    pub async fn list_routes(&self) -> Result<Vec<String>> {
        let url = self.url("allroutes", None)?;
        debug!("🧭 Fetching routes: {}", url);

        let response = self.send(self.client.get(url)).await?;
        let envelope: DataEnvelope<Vec<String>> = decode(response).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn fetch_rows(&self, resource: &str) -> Result<Vec<Record>> {
        let url = self.url(resource, None)?;
        debug!("📋 Fetching rows: {}", url);

        let response = self.send(self.client.get(url)).await?;
        let envelope: DataEnvelope<Vec<Record>> = decode(response).await?;
        let rows = envelope.data.unwrap_or_default();
        debug!("✅ {} returned {} rows", resource, rows.len());
        Ok(rows)
    }

    pub async fn create(&self, resource: &str, payload: &Record) -> Result<()> {
        let url = self.url(resource, None)?;
        info!("➕ Creating record: {}", url);

        self.send(self.client.post(url).json(payload)).await?;
        Ok(())
    }

    pub async fn update(&self, resource: &str, id: &str, payload: &Record) -> Result<()> {
        let url = self.url(resource, Some(id))?;
        info!("✏️ Updating record: {}", url);

        self.send(self.client.put(url).json(payload)).await?;
        Ok(())
    }

    pub async fn delete(&self, resource: &str, id: &str) -> Result<()> {
        let url = self.url(resource, Some(id))?;
        info!("🗑️ Deleting record: {}", url);

        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    // Authenticated request: attach the bearer token, turn 401 into a logout.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.tokens.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("🔒 Server rejected the session token, clearing it");
            self.tokens.clear_token();
            return Err(AdminError::Unauthorized);
        }
        if !status.is_success() {
            return Err(server_error(response).await);
        }
        Ok(response)
    }
}

async fn server_error(response: Response) -> AdminError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message);
    warn!("❌ Server returned {}: {:?}", status, message);
    AdminError::Server { status, message }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<DataEnvelope<T>> {
    let body = response.bytes().await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DataEnvelope { data: None });
    }
    Ok(serde_json::from_slice(&body)?)
}

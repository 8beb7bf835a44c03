// src/api/client.rs
//! Route service client

use super::payload::{CreateRouteResponse, PersistedRoute, ValidatedRouteData};
use crate::config::RecorderConfig;
use crate::error::{RecorderError, Result};
use log::{debug, info, warn};
use reqwest::{Client, Response};
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// Destination for finished routes.
///
/// `create` is the primary step and must succeed for a save to count.
/// `attach_screenshot` is secondary; callers treat its failure as non-fatal.
pub trait RouteStore {
    fn create(
        &self,
        route: &ValidatedRouteData,
    ) -> impl Future<Output = Result<PersistedRoute>> + Send;

    fn attach_screenshot(
        &self,
        route_id: &str,
        image: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// `RouteStore` backed by the HTTP route service
#[derive(Debug, Clone)]
pub struct HttpRouteStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRouteStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecorderError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &RecorderConfig) -> Result<Self> {
        Self::new(
            &config.api_base_url,
            config.api_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl RouteStore for HttpRouteStore {
    async fn create(&self, route: &ValidatedRouteData) -> Result<PersistedRoute> {
        let url = format!("{}/routes", self.base_url);
        debug!("POST {} ({} points)", url, route.points.len());

        let response = self
            .authorize(self.client.post(&url).json(route))
            .send()
            .await?;
        let response = check_status(response).await?;

        // a 2xx means the route exists, whatever the body says
        let persisted = match response.text().await {
            Ok(body) => parse_created(&body),
            Err(e) => {
                warn!("Route created but reading the response failed: {}", e);
                PersistedRoute::default()
            }
        };
        match &persisted.id {
            Some(id) => info!("Route created with id {}", id),
            None => warn!("Route created but the service returned no id"),
        }
        Ok(persisted)
    }

    async fn attach_screenshot(&self, route_id: &str, image: &Path) -> Result<()> {
        let url = format!("{}/routes/{}/screenshot", self.base_url, route_id);

        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "screenshot.png".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(image))
            .map_err(|e| RecorderError::Other(format!("Invalid screenshot type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("screenshot", part);

        debug!("POST {}", url);
        let response = self
            .authorize(self.client.post(&url).multipart(form))
            .send()
            .await?;
        check_status(response).await?;

        info!("Screenshot attached to route {}", route_id);
        Ok(())
    }
}

fn parse_created(body: &str) -> PersistedRoute {
    match serde_json::from_str::<CreateRouteResponse>(body) {
        Ok(parsed) => parsed.into_route(),
        Err(e) => {
            warn!("Unexpected create response body: {}", e);
            PersistedRoute::default()
        }
    }
}

/// Turn non-2xx responses into `Server` errors carrying the service's message
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RecorderError::Server {
        status: status.as_u16(),
        message: server_message(&body).unwrap_or_else(|| status.to_string()),
    })
}

fn server_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return Some(msg.to_string());
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

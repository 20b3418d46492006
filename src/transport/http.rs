//! HTTP transport backed by reqwest.

use crate::config::TransportConfig;
use crate::error::ClientError;
use crate::response::Response;
use crate::transport::{FormData, Transport};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use std::time::Duration;
use tracing::{debug, warn};

/// Header the server uses to tell client-driven fetches from browser page loads.
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "DjangoBridge";
pub const OVERLAY_HEADER: &str = "X-DjangoBridge-Overlay";

pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::TransportSetup(format!("Invalid base URL {:?}: {}", config.base_url, e))
        })?;
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| {
                ClientError::TransportSetup(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Origin requests are issued against, e.g. `https://example.com`.
    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    fn url_for(&self, path: &str) -> Option<Url> {
        self.base_url.join(path).ok()
    }

    async fn send(&self, request: RequestBuilder, overlay: bool) -> Response {
        let mut request = request.header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE);
        if overlay {
            request = request.header(OVERLAY_HEADER, "true");
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Request failed before a response arrived");
                return Response::NetworkError;
            }
        };

        let status = response.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), "Server returned an error status");
            return Response::ServerError;
        }

        match response.json::<Response>().await {
            Ok(parsed) => {
                debug!(status = status.as_u16(), action = parsed.action(), "Response received");
                parsed
            }
            Err(e) if e.is_timeout() => {
                warn!(error = %e, "Timed out reading response body");
                Response::NetworkError
            }
            Err(e) => {
                warn!(status = status.as_u16(), error = %e, "Response body is not a navigation response");
                Response::ServerError
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, overlay: bool) -> Response {
        let Some(url) = self.url_for(path) else {
            warn!(path, "Cannot build request URL");
            return Response::NetworkError;
        };
        self.send(self.client.get(url), overlay).await
    }

    async fn post(&self, path: &str, form: FormData, overlay: bool) -> Response {
        let Some(url) = self.url_for(path) else {
            warn!(path, "Cannot build request URL");
            return Response::NetworkError;
        };
        self.send(self.client.post(url).form(form.fields()), overlay).await
    }
}

//! HTTP client for the storefront service.

use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::StoreApi;
use super::detail::extract_error_message;
use super::types::{
    ApiError, CheckoutRequest, CheckoutResponse, GenerateResponse, PreviewResponse,
    ProductsResponse, SpeechRequest, TokenStatus, VoiceFilter, VoicesResponse,
};

/// Header carrying the anonymous device identifier.
pub const DEVICE_ID_HEADER: &str = "X-Device-Id";

/// Blocking HTTP implementation of [`StoreApi`].
pub struct HttpStoreApi {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpStoreApi {
    /// Create a client for the service rooted at `base_url`.
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    /// Get the base URL for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Resolve an audio URL returned by the service.
    ///
    /// Server-relative paths (`/audio/x.mp3`) resolve against the API
    /// origin; absolute URLs are kept as they are.
    pub fn resolve_audio_url(&self, audio_url: &str) -> Result<Url, ApiError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        base.join(audio_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{audio_url}: {e}")))
    }

    fn map_send_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout.as_secs())
        } else {
            ApiError::ConnectionFailed(err.to_string())
        }
    }

    /// Send a request, turning non-2xx answers into [`ApiError::Rejected`].
    fn send(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response, ApiError> {
        let response = request.send().map_err(|e| self.map_send_error(e))?;
        let status = response.status();

        if !status.is_success() {
            // A body that is not JSON still yields the fallback message.
            let body = response
                .json::<serde_json::Value>()
                .unwrap_or(serde_json::Value::Null);
            let message = extract_error_message(&body);
            debug!(status = status.as_u16(), %message, "request rejected");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(request)?.json().map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout.as_secs())
            } else {
                ApiError::InvalidResponse(e.to_string())
            }
        })
    }
}

impl StoreApi for HttpStoreApi {
    fn entitlement_status(&self, device_id: &str) -> Result<TokenStatus, ApiError> {
        let url = self.endpoint("/entitlement/status");
        debug!(%url, "fetching entitlement status");

        self.send_json(self.client.get(&url).header(DEVICE_ID_HEADER, device_id))
    }

    fn generate_speech(
        &self,
        request: &SpeechRequest,
        device_id: &str,
    ) -> Result<GenerateResponse, ApiError> {
        let url = self.endpoint("/speech/generate");
        debug!(%url, voice = %request.voice_id, chars = request.text.len(), "generating speech");

        self.send_json(
            self.client
                .post(&url)
                .header(DEVICE_ID_HEADER, device_id)
                .json(request),
        )
    }

    fn preview_speech(&self, request: &SpeechRequest) -> Result<PreviewResponse, ApiError> {
        let url = self.endpoint("/speech/preview");
        debug!(%url, voice = %request.voice_id, "previewing voice");

        self.send_json(self.client.post(&url).json(request))
    }

    fn list_voices(&self, filter: &VoiceFilter) -> Result<VoicesResponse, ApiError> {
        let url = self.endpoint("/voices");

        self.send_json(self.client.get(&url).query(&filter.query_pairs()))
    }

    fn list_products(&self) -> Result<ProductsResponse, ApiError> {
        let url = self.endpoint("/billing/products");

        self.send_json(self.client.get(&url))
    }

    fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, ApiError> {
        let url = self.endpoint("/billing/checkout");
        debug!(%url, product = %request.product_id, "creating checkout");

        self.send_json(self.client.post(&url).json(request))
    }

    fn download_audio(&self, audio_url: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.resolve_audio_url(audio_url)?;
        debug!(%url, "downloading audio");

        self.send(self.client.get(url))?
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

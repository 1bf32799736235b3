//! Communication with the storefront service.
//!
//! The service owns the authoritative entitlement records and performs
//! speech synthesis and checkout. This module exposes it through the
//! [`StoreApi`] trait so the rest of the crate can be exercised against
//! mock implementations.

mod client;
mod detail;
mod types;

pub use client::{DEVICE_ID_HEADER, HttpStoreApi};
pub use detail::{FALLBACK_MESSAGE, extract_error_message};
pub use types::{
    ApiError, CheckoutRequest, CheckoutResponse, GenerateResponse, MAX_SPEED, MAX_TEXT_CHARS,
    MIN_SPEED, PreviewResponse, Product, ProductsResponse, SpeechRequest, TokenStatus, Voice,
    VoiceFilter, VoicesResponse,
};

/// Trait for storefront service communication.
#[cfg_attr(test, mockall::automock)]
pub trait StoreApi: Send + Sync {
    /// Fetch the authoritative entitlement status for a device.
    fn entitlement_status(&self, device_id: &str) -> Result<TokenStatus, ApiError>;

    /// Generate speech, consuming the free trial or one token server-side.
    fn generate_speech(
        &self,
        request: &SpeechRequest,
        device_id: &str,
    ) -> Result<GenerateResponse, ApiError>;

    /// Generate an unmetered preview.
    fn preview_speech(&self, request: &SpeechRequest) -> Result<PreviewResponse, ApiError>;

    /// List catalogue voices matching the filter.
    fn list_voices(&self, filter: &VoiceFilter) -> Result<VoicesResponse, ApiError>;

    /// List purchasable token packs.
    fn list_products(&self) -> Result<ProductsResponse, ApiError>;

    /// Open a checkout session for a token pack.
    fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, ApiError>;

    /// Download generated audio as raw bytes.
    fn download_audio(&self, audio_url: &str) -> Result<Vec<u8>, ApiError>;
}

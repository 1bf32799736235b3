//! Storefront request/response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest text the service accepts for a single generation.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Accepted speech speed range.
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

/// Errors that can occur when talking to the storefront service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Non-2xx answer. Displays only the message extracted from the body.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Entitlement status for one device, as reported by the service.
///
/// Counts are signed on the wire; the service computes `remaining_tokens`
/// by subtraction and nothing stops it from going below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatus {
    pub total_tokens: i64,
    pub used_tokens: i64,
    pub remaining_tokens: i64,
    pub free_trial_available: bool,
    pub free_trial_used: bool,
}

/// A voice offered by the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub gender: String,
    pub language: String,
    pub locale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Response from the voice catalogue endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub voices: Vec<Voice>,
    pub total: usize,
    #[serde(default)]
    pub providers: HashMap<String, usize>,
}

/// Optional catalogue filters. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceFilter {
    pub provider: Option<String>,
    pub language: Option<String>,
    pub gender: Option<String>,
}

impl VoiceFilter {
    /// Query pairs for the non-empty filters, in a fixed order.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("provider", self.provider.as_deref()),
            ("language", self.language.as_deref()),
            ("gender", self.gender.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| match value {
            Some(v) if !v.is_empty() => Some((key, v)),
            _ => None,
        })
        .collect()
    }
}

/// Body of both the generate and the preview calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_speed() -> f32 {
    1.0
}

impl SpeechRequest {
    /// Create a new speech request at normal speed.
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            speed: 1.0,
        }
    }

    /// Set the speech speed.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Check the request against the service's input contract.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        let chars = self.text.chars().count();
        if chars > MAX_TEXT_CHARS {
            return Err(format!(
                "Text is too long: {chars} characters (max {MAX_TEXT_CHARS})"
            ));
        }

        if !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(format!(
                "Speed must be between {MIN_SPEED} and {MAX_SPEED}, got {}",
                self.speed
            ));
        }

        match self.voice_id.split_once(':') {
            Some((provider, name)) if !provider.is_empty() && !name.is_empty() => Ok(()),
            _ => Err(format!(
                "Invalid voice id '{}'. Use 'provider:voice_name'",
                self.voice_id
            )),
        }
    }
}

/// Result of a metered generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default)]
    pub audio_url: Option<String>,
    pub provider: String,
    pub voice_id: String,
    pub characters_used: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of an unmetered preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub audio_url: String,
    #[serde(default)]
    pub is_preview: bool,
}

/// A purchasable token pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub tokens: u32,
    pub price: f64,
    pub price_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub product_id: String,
    pub device_id: String,
    pub success_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub checkout_id: String,
}

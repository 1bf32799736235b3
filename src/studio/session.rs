//! Studio session implementation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    ApiError, CheckoutRequest, CheckoutResponse, PreviewResponse, Product, SpeechRequest,
    StoreApi, Voice, VoiceFilter,
};
use crate::entitlement::{EntitlementState, EntitlementStore};
use crate::identity::{DeviceIdResolver, DeviceIdentity};

/// Text spoken by a preview when none is given.
pub const SAMPLE_TEXT: &str =
    "Hello! Welcome to VoiceForge AI, your multi-provider voiceover studio.";

/// Message shown when the gate refuses a metered action.
pub const NO_TOKENS_MESSAGE: &str = "No tokens remaining. Please purchase more to continue.";

/// Errors that can occur during studio actions.
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("{msg}", msg = NO_TOKENS_MESSAGE)]
    NoTokens,

    #[error("Text cannot be empty")]
    EmptyText,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    GenerationFailed(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What a successful generation consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consumption {
    FreeTrial,
    Token,
}

/// A completed metered generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub audio_url: String,
    pub provider: String,
    pub voice_id: String,
    pub characters_used: usize,
    pub consumed: Consumption,
}

/// One client session against the storefront.
///
/// Owns the identity resolver and the entitlement store and drives every
/// metered action through the same sequence: gate check, remote call,
/// optimistic update, reconciling fetch. The first three happen in
/// [`Studio::generate`]; the fetch is issued afterwards with
/// [`Studio::reconcile`] or [`Studio::reconcile_while`] so it never holds
/// up the generated audio.
pub struct Studio<A: StoreApi> {
    api: A,
    resolver: DeviceIdResolver,
    entitlement: EntitlementStore,
}

impl<A: StoreApi> Studio<A> {
    pub fn new(api: A, resolver: DeviceIdResolver) -> Self {
        Self::with_entitlement(api, resolver, EntitlementStore::new())
    }

    /// Create a session around an existing entitlement store.
    pub fn with_entitlement(api: A, resolver: DeviceIdResolver, entitlement: EntitlementStore) -> Self {
        Self {
            api,
            resolver,
            entitlement,
        }
    }

    pub fn device(&self) -> &DeviceIdentity {
        self.resolver.resolve()
    }

    pub fn entitlement(&self) -> EntitlementState {
        self.entitlement.snapshot()
    }

    /// Resolve the device identity and load its entitlement status.
    pub fn start_session(&self) -> EntitlementState {
        let device_id = self.device().id.clone();
        self.entitlement.fetch_status(&self.api, &device_id)
    }

    /// Re-fetch entitlement status after returning from checkout.
    pub fn confirm_payment(&self) -> EntitlementState {
        self.start_session()
    }

    /// Generate speech, consuming the free trial or one token.
    ///
    /// Nothing in the entitlement state changes unless the service confirms
    /// the generation. The optimistic update is applied before returning;
    /// callers follow up with a reconciling fetch.
    pub fn generate(&self, request: &SpeechRequest) -> Result<Generation, StudioError> {
        if request.text.trim().is_empty() {
            return Err(StudioError::EmptyText);
        }
        request.validate().map_err(StudioError::InvalidRequest)?;

        let gate = self.entitlement.snapshot();
        if !gate.can_consume() {
            debug!("generation refused locally: no trial and no tokens");
            return Err(StudioError::NoTokens);
        }

        let device_id = self.device().id.clone();
        let response = self.api.generate_speech(request, &device_id)?;

        let audio_url = match response.audio_url {
            Some(url) if response.success => url,
            _ => {
                let reason = response
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "Generation failed".to_string());
                return Err(StudioError::GenerationFailed(reason));
            }
        };

        let consumed = if gate.free_trial_available {
            self.entitlement.mark_free_trial_consumed();
            Consumption::FreeTrial
        } else {
            self.entitlement.decrement_token();
            Consumption::Token
        };
        info!(voice = %response.voice_id, ?consumed, "speech generated");

        Ok(Generation {
            audio_url,
            provider: response.provider,
            voice_id: response.voice_id,
            characters_used: response.characters_used,
            consumed,
        })
    }

    /// Overwrite local state with the service's view after a metered action.
    ///
    /// A failure keeps the optimistic values and only sets `error`.
    pub fn reconcile(&self) -> EntitlementState {
        let device_id = self.device().id.clone();
        let reconciled = self.entitlement.fetch_status(&self.api, &device_id);
        if let Some(e) = &reconciled.error {
            warn!(error = %e, "reconciling fetch failed, keeping optimistic state");
        }
        reconciled
    }

    /// Run `work` on the calling thread while the reconciling fetch runs on
    /// a scoped background thread.
    ///
    /// `work` is not delayed by a slow status endpoint; the call returns
    /// once both have settled.
    pub fn reconcile_while<T>(&self, work: impl FnOnce() -> T) -> (T, EntitlementState) {
        std::thread::scope(|s| {
            let reconcile = s.spawn(|| self.reconcile());
            let output = work();
            let state = reconcile
                .join()
                .unwrap_or_else(|_| self.entitlement.snapshot());
            (output, state)
        })
    }

    /// Preview a voice. Unmetered; never touches entitlement state.
    pub fn preview(
        &self,
        voice_id: &str,
        speed: f32,
        text: Option<&str>,
    ) -> Result<PreviewResponse, StudioError> {
        let text = text.filter(|t| !t.trim().is_empty()).unwrap_or(SAMPLE_TEXT);
        let request = SpeechRequest::new(text, voice_id).with_speed(speed);
        request.validate().map_err(StudioError::InvalidRequest)?;

        Ok(self.api.preview_speech(&request)?)
    }

    pub fn voices(&self, filter: &VoiceFilter) -> Result<Vec<Voice>, StudioError> {
        Ok(self.api.list_voices(filter)?.voices)
    }

    pub fn products(&self) -> Result<Vec<Product>, StudioError> {
        Ok(self.api.list_products()?.products)
    }

    /// Open a checkout for a token pack.
    ///
    /// The payment provider sends the buyer back to
    /// `{return_base}/payment/success?device_id={id}`.
    pub fn checkout(&self, product_id: &str, return_base: &str) -> Result<CheckoutResponse, StudioError> {
        let device_id = self.device().id.clone();
        let success_url = format!(
            "{}/payment/success?device_id={device_id}",
            return_base.trim_end_matches('/')
        );

        let request = CheckoutRequest {
            product_id: product_id.to_string(),
            device_id,
            success_url,
        };

        Ok(self.api.create_checkout(&request)?)
    }

    /// Download the audio of a completed generation or preview.
    pub fn download(&self, audio_url: &str) -> Result<Vec<u8>, StudioError> {
        Ok(self.api.download_audio(audio_url)?)
    }
}

//! CLI argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

/// Text-to-speech storefront client.
#[derive(Parser, Debug)]
#[command(name = "voicestore")]
#[command(about = "Browse voices, generate speech and manage token credits")]
#[command(version)]
pub struct Args {
    /// Storefront API root URL
    #[arg(long, env = "VOICESTORE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "VOICESTORE_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Directory holding the fallback device id
    #[arg(long, env = "VOICESTORE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Skip host fingerprinting and use the stored fallback id
    #[arg(long)]
    pub no_fingerprint: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show this device's anonymous identifier
    DeviceId,

    /// Show token balance and free-trial status
    Status,

    /// List catalogue voices
    Voices {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        gender: Option<String>,
    },

    /// Preview a voice (free)
    Preview {
        /// Voice id, e.g. "openai:alloy"
        #[arg(long)]
        voice: String,

        /// Speech speed multiplier (0.5 to 2.0)
        #[arg(short, long, default_value = "1.0")]
        speed: f32,

        /// Text to speak instead of the sample sentence
        #[arg(long)]
        text: Option<String>,
    },

    /// Generate speech (uses the free trial or one token)
    Generate {
        /// Text to generate speech from
        text: String,

        /// Voice id, e.g. "openai:alloy"
        #[arg(long)]
        voice: String,

        /// Speech speed multiplier (0.5 to 2.0)
        #[arg(short, long, default_value = "1.0")]
        speed: f32,

        /// Save the generated audio to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List token packs for sale
    Products,

    /// Start a checkout for a token pack
    Checkout {
        product_id: String,

        /// Base URL the payment provider returns to
        #[arg(long)]
        return_url: String,
    },

    /// Refresh the balance after completing a checkout
    ConfirmPayment,
}

//! voicestore CLI entry point.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use voicestore_rs::api::{HttpStoreApi, SpeechRequest, StoreApi, VoiceFilter};
use voicestore_rs::cli::{Args, Command};
use voicestore_rs::config::StoreConfig;
use voicestore_rs::entitlement::EntitlementState;
use voicestore_rs::identity::{
    BlockedProbe, DeviceIdResolver, FileIdStore, FingerprintProbe, HostProbe,
};
use voicestore_rs::studio::Studio;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = StoreConfig::from(&args);
    let api = HttpStoreApi::new(&config.api_url, config.timeout)
        .context("Failed to create storefront client")?;
    let studio = Studio::new(api, build_resolver(&config));

    match args.command {
        Command::DeviceId => {
            let device = studio.device();
            println!("{}", device.id);
            if device.is_fallback() {
                println!("  (fallback id: host fingerprint unavailable)");
            }
            Ok(())
        }
        Command::Status => {
            let state = studio.start_session();
            print_status(&state);
            match state.error {
                Some(e) => bail!("Failed to fetch token status: {e}"),
                None => Ok(()),
            }
        }
        Command::Voices {
            provider,
            language,
            gender,
        } => list_voices(
            &studio,
            &VoiceFilter {
                provider,
                language,
                gender,
            },
        ),
        Command::Preview { voice, speed, text } => {
            let preview = studio
                .preview(&voice, speed, text.as_deref())
                .context("Preview failed")?;
            println!("Preview ready: {}", preview.audio_url);
            Ok(())
        }
        Command::Generate {
            text,
            voice,
            speed,
            output,
        } => generate_speech(&studio, text, &voice, speed, output.as_deref()),
        Command::Products => list_products(&studio),
        Command::Checkout {
            product_id,
            return_url,
        } => {
            let checkout = studio
                .checkout(&product_id, &return_url)
                .context("Checkout failed")?;
            println!("Complete your purchase at:");
            println!("  {}", checkout.checkout_url);
            println!("Then run `voicestore confirm-payment`.");
            Ok(())
        }
        Command::ConfirmPayment => {
            let state = studio.confirm_payment();
            if let Some(e) = state.error {
                bail!("Failed to refresh token status: {e}");
            }
            println!("Payment confirmed. {} tokens remaining.", state.remaining_tokens);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_resolver(config: &StoreConfig) -> DeviceIdResolver {
    let probe: Box<dyn FingerprintProbe> = if config.fingerprint {
        Box::new(HostProbe::new())
    } else {
        Box::new(BlockedProbe)
    };

    let store = match &config.data_dir {
        Some(dir) => FileIdStore::with_dir(dir.clone()),
        None => FileIdStore::new(),
    };

    DeviceIdResolver::new(probe, Box::new(store))
}

fn print_status(state: &EntitlementState) {
    println!("Device tokens:");
    println!("  Remaining: {}", state.remaining_tokens);
    println!("  Used: {} of {}", state.used_tokens, state.total_tokens);
    println!(
        "  Free trial: {}",
        if state.free_trial_available {
            "available"
        } else {
            "used"
        }
    );
    if let Some(synced) = state.last_synced {
        println!("  Synced: {}", synced.to_rfc3339());
    }
}

fn list_voices<A: StoreApi>(studio: &Studio<A>, filter: &VoiceFilter) -> Result<()> {
    let voices = studio.voices(filter).context("Failed to list voices")?;

    if voices.is_empty() {
        println!("No voices found.");
        return Ok(());
    }

    println!("Available voices:");
    for voice in voices {
        println!("  {} - {} ({}, {})", voice.id, voice.name, voice.locale, voice.gender);
        if let Some(description) = &voice.description {
            println!("    {description}");
        }
        if !voice.available {
            println!("    (currently unavailable)");
        }
    }

    Ok(())
}

fn list_products<A: StoreApi>(studio: &Studio<A>) -> Result<()> {
    let products = studio.products().context("Failed to list products")?;

    println!("Token packs:");
    for product in products {
        println!(
            "  {:<10} {} - {} tokens for {}",
            product.id, product.name, product.tokens, product.price_formatted
        );
    }

    Ok(())
}

fn generate_speech<A: StoreApi>(
    studio: &Studio<A>,
    text: String,
    voice: &str,
    speed: f32,
    output: Option<&Path>,
) -> Result<()> {
    let session = studio.start_session();
    if let Some(warning) = session.sync_warning() {
        eprintln!("Warning: {warning}");
    }

    println!("Generating speech...");
    println!("  Voice: {voice}");
    println!("  Speed: {speed:.1}x");

    let request = SpeechRequest::new(text, voice).with_speed(speed);
    let generation = studio
        .generate(&request)
        .context("Failed to generate speech")?;

    println!("Audio ready: {}", generation.audio_url);
    println!("  Characters: {}", generation.characters_used);

    // The balance refresh runs beside the download instead of ahead of it.
    let (saved, _) = studio.reconcile_while(|| save_audio(studio, &generation.audio_url, output));
    saved?;

    let state = studio.entitlement();
    if state.free_trial_available {
        println!("Free trial still available.");
    } else {
        println!("{} tokens remaining.", state.remaining_tokens);
    }

    Ok(())
}

fn save_audio<A: StoreApi>(studio: &Studio<A>, audio_url: &str, output: Option<&Path>) -> Result<()> {
    let Some(path) = output else {
        return Ok(());
    };

    let audio = studio
        .download(audio_url)
        .context("Failed to download audio")?;
    fs::write(path, &audio)
        .with_context(|| format!("Failed to write audio to: {}", path.display()))?;
    println!("Audio saved to: {}", path.display());
    println!("  Size: {} bytes", audio.len());

    Ok(())
}

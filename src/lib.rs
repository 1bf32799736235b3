//! voicestore-rs: client for a text-to-speech storefront.
//!
//! Tracks how many generation credits the current device has and whether
//! its one free trial is still unused, keeping that state in step with the
//! storefront service. Devices are identified anonymously by a host
//! fingerprint, with a persisted random id when fingerprinting fails.

pub mod api;
pub mod cli;
pub mod config;
pub mod entitlement;
pub mod identity;
pub mod studio;

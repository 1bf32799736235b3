//! Studio session orchestrator.
//!
//! Coordinates the device identity, the entitlement store and the
//! storefront service for every user-facing action.

mod session;

pub use session::{
    Consumption, Generation, NO_TOKENS_MESSAGE, SAMPLE_TEXT, Studio, StudioError,
};

//! Token balance and free-trial state for the current device.
//!
//! The service is the source of truth. Local state is filled by full
//! fetches and nudged by optimistic edits after successful generations,
//! and the next fetch overwrites whatever drift those edits introduced.

mod store;

pub use store::{EntitlementState, EntitlementStore};

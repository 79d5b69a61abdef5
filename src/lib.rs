//! # IdMesh
//!
//! An incremental contact identity reconciliation engine.
//!
//! Contact observations carrying an email address, a phone number, or both
//! are resolved into identity clusters with exactly one canonical primary
//! record each. Bridging observations merge clusters; the oldest primary
//! always survives.

pub mod config;
pub mod error;
pub mod model;
pub mod resolver;
pub mod server;
pub mod store;

// Re-export main types for convenience
pub use config::ServiceConfig;
pub use error::{ResolveError, StoreError};
pub use model::{
    Contact, ContactDraft, ContactId, ConsolidatedIdentity, LinkPrecedence, Observation,
};
pub use resolver::IdentityResolver;
pub use server::{build_router, AppState, IdentifyRequest, IdentifyResponse};
pub use store::{ContactStore, MemoryStore};

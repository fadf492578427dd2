//! Vela IBM Cloud Provider
//!
//! IBM Cloud bindings: a managed encryption key resource and a GitHub
//! toolchain tool data source.
//!
//! ## Module Structure
//!
//! - `provider` - IbmProvider implementation and resource type registry
//! - `kms_key` - encryption key lifecycle (create/read/update/delete/exists)
//! - `toolchain_tool` - read-only toolchain tool lookup
//! - `session` - authenticated client session, built fresh per call
//! - `api` - typed REST clients for the upstream services
//! - `crn` - typed CRN parsing
//! - `endpoints` - public/private endpoint resolution and console URLs
//! - `schemas` - declarative attribute schemas

pub mod api;
pub mod crn;
pub mod endpoints;
pub mod kms_key;
pub mod provider;
pub mod schemas;
pub mod session;
pub mod toolchain_tool;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use endpoints::EndpointType;
pub use provider::IbmProvider;
pub use session::{ClientSession, IbmSession, SessionConfig};

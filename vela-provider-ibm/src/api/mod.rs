//! Thin typed clients for the upstream IBM Cloud REST APIs
//!
//! Each service gets a trait (so lifecycle code can run against mocks)
//! and a reqwest-backed client. The clients perform single blocking-style
//! calls with no retries; backoff policy belongs to the caller.

pub mod error;
pub mod kms;
pub mod resource_controller;
pub mod toolchain;

pub use error::{ApiError, ApiResult};
pub use kms::{Key, KeyManagementApi, KeyProtectClient, KEY_STATE_DELETED};
pub use resource_controller::{ResourceControllerApi, ResourceControllerClient, ResourceInstance};
pub use toolchain::{CdToolchainApi, CdToolchainClient, ToolReferent, ToolchainTool};

//! Vela Core
//!
//! Core library for an infrastructure management tool: the generic
//! resource/state model, attribute schemas, and the Provider contract
//! that cloud bindings implement.

pub mod differ;
pub mod provider;
pub mod resource;
pub mod schema;

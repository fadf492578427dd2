//! Schema definitions for the IBM Cloud resource types

pub mod kms_key;
pub mod toolchain_tool;

use vela_core::schema::ResourceSchema;

/// Returns all schemas declared by this provider
pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        kms_key::kms_key_schema(),
        toolchain_tool::toolchain_tool_github_schema(),
    ]
}

//! Schema definition for the managed encryption key resource

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::crn::instance_id_from_crn;
use crate::endpoints::EndpointType;

/// The host persists the instance GUID while users may declare the full
/// instance CRN; both name the same instance.
fn suppress_instance_id_diff(old: &str, new: &str) -> bool {
    old == instance_id_from_crn(new)
}

fn rfc3339_timestamp() -> AttributeType {
    AttributeType::Custom {
        name: "Rfc3339Timestamp".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
                .map(|_| ())
                .map_err(|e| format!("the date format follows RFC 3339: {}", e)),
            _ => Err("Expected string".to_string()),
        },
    }
}

/// Returns the schema for managed encryption keys
pub fn kms_key_schema() -> ResourceSchema {
    ResourceSchema::new("kms_key")
        .with_description("A root or standard key in a key-management service instance")
        .attribute(
            AttributeSchema::new("instance_id", AttributeType::String)
                .required()
                .force_new()
                .with_diff_suppress(suppress_instance_id_diff)
                .with_description("Key protect or hpcs instance GUID or CRN"),
        )
        .attribute(
            AttributeSchema::new("key_ring_id", AttributeType::String)
                .optional()
                .force_new()
                .with_default(Value::String("default".to_string()))
                .with_description("Key Ring for the Key"),
        )
        .attribute(
            AttributeSchema::new("key_id", AttributeType::String)
                .computed()
                .with_description("Key ID"),
        )
        .attribute(
            AttributeSchema::new("key_name", AttributeType::String)
                .required()
                .force_new()
                .with_description("Key name"),
        )
        .attribute(
            AttributeSchema::new("type", AttributeType::String)
                .computed()
                .with_description("type of service hs-crypto or kms"),
        )
        .attribute(
            AttributeSchema::new(
                "endpoint_type",
                AttributeType::Enum(
                    EndpointType::ALLOWED.iter().map(|s| s.to_string()).collect(),
                ),
            )
            .optional()
            .computed()
            .force_new()
            .with_description("public or private"),
        )
        .attribute(
            AttributeSchema::new("standard_key", AttributeType::Bool)
                .optional()
                .force_new()
                .with_default(Value::Bool(false))
                .with_description("Standard key type"),
        )
        .attribute(
            AttributeSchema::new("payload", AttributeType::String)
                .optional()
                .computed()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("encrypted_nonce", AttributeType::String)
                .optional()
                .force_new()
                .with_description("Only for imported root key"),
        )
        .attribute(
            AttributeSchema::new("iv_value", AttributeType::String)
                .optional()
                .force_new()
                .with_description("Only for imported root key"),
        )
        .attribute(
            AttributeSchema::new("force_delete", AttributeType::Bool)
                .optional()
                .with_default(Value::Bool(false))
                .with_description("set to true to force delete the key"),
        )
        .attribute(
            AttributeSchema::new("crn", AttributeType::String)
                .computed()
                .with_description("Crn of the key"),
        )
        .attribute(
            AttributeSchema::new("expiration_date", rfc3339_timestamp())
                .optional()
                .force_new()
                .with_description(
                    "The date the key material expires. The date format follows RFC 3339. \
                     A key moves into the Deactivated state within one hour past its \
                     expiration date, if one is assigned",
                ),
        )
        .attribute(
            AttributeSchema::new("instance_crn", AttributeType::String)
                .computed()
                .with_description("Key protect or hpcs instance CRN"),
        )
        .attribute(
            AttributeSchema::new("resource_name", AttributeType::String)
                .computed()
                .with_description("The name of the resource"),
        )
        .attribute(
            AttributeSchema::new("resource_crn", AttributeType::String)
                .computed()
                .with_description("The crn of the resource"),
        )
        .attribute(
            AttributeSchema::new("resource_status", AttributeType::String)
                .computed()
                .with_description("The status of the resource"),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", AttributeType::String)
                .computed()
                .with_description("The resource group name in which resource is provisioned"),
        )
        .attribute(
            AttributeSchema::new("resource_controller_url", AttributeType::String)
                .computed()
                .with_description(
                    "The URL of the IBM Cloud dashboard that can be used to explore and \
                     view details about the resource",
                ),
        )
}

//! Schema definition for the GitHub toolchain tool data source

use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

fn string_map_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Map(Box::new(AttributeType::String))))
}

/// Returns the schema for the GitHub toolchain tool data source
pub fn toolchain_tool_github_schema() -> ResourceSchema {
    ResourceSchema::new("cd_toolchain_tool_github")
        .with_description("A GitHub tool integration bound into a CI/CD toolchain")
        .attribute(
            AttributeSchema::new("toolchain_id", AttributeType::String)
                .required()
                .with_description("ID of the toolchain."),
        )
        .attribute(
            AttributeSchema::new("tool_id", AttributeType::String)
                .required()
                .with_description("ID of the tool bound to the toolchain."),
        )
        .attribute(
            AttributeSchema::new("resource_group_id", AttributeType::String)
                .computed()
                .with_description("Resource group where the tool can be found."),
        )
        .attribute(
            AttributeSchema::new("crn", AttributeType::String)
                .computed()
                .with_description("Tool CRN."),
        )
        .attribute(
            AttributeSchema::new("toolchain_crn", AttributeType::String)
                .computed()
                .with_description("CRN of toolchain which the tool is bound to."),
        )
        .attribute(
            AttributeSchema::new("href", AttributeType::String)
                .computed()
                .with_description("URI representing the tool."),
        )
        .attribute(
            AttributeSchema::new("referent", string_map_list())
                .computed()
                .with_description(
                    "Information on URIs to access this resource through the UI or API.",
                ),
        )
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .computed()
                .with_description("Tool name."),
        )
        .attribute(
            AttributeSchema::new("updated_at", AttributeType::String)
                .computed()
                .with_description("Latest tool update timestamp."),
        )
        .attribute(
            AttributeSchema::new("parameters", string_map_list())
                .computed()
                .with_description(
                    "Unique key-value pairs representing parameters to be used to create \
                     the tool.",
                ),
        )
        .attribute(
            AttributeSchema::new("state", AttributeType::String)
                .computed()
                .with_description("Current configuration state of the tool."),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vela_core::resource::Value;

    #[test]
    fn lookup_attributes_are_required() {
        let schema = toolchain_tool_github_schema();

        let mut attrs = HashMap::new();
        attrs.insert("toolchain_id".to_string(), Value::String("tc-1".to_string()));
        assert!(schema.validate(&attrs).is_err());

        attrs.insert("tool_id".to_string(), Value::String("tool-1".to_string()));
        assert!(schema.validate(&attrs).is_ok());
    }
}

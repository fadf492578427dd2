//! Differ - Compare desired state with current state
//!
//! Compares the desired state declared by the user with the current state
//! fetched from the Provider. Computed attributes are ignored and
//! per-attribute diff suppression from the schema is honored.

use std::collections::HashMap;

use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
        /// True when a changed attribute is marked force-new
        requires_replacement: bool,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Resource exists but not in desired state -> needs deletion
    Delete(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: &ResourceSchema) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, schema);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        let requires_replacement = changed
            .iter()
            .any(|name| schema.attributes.get(name).is_some_and(|a| a.force_new));
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
            requires_replacement,
        }
    }
}

/// Find changed attributes between desired and current state
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    schema: &ResourceSchema,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        // Skip internal attributes (starting with _)
        if key.starts_with('_') {
            continue;
        }

        let attr_schema = schema.attributes.get(key);

        // Purely computed attributes are provider-assigned, never diffed
        if attr_schema.is_some_and(|a| !a.is_user_settable()) {
            continue;
        }

        match current.get(key) {
            Some(current_value) if current_value == desired_value => {}
            Some(Value::String(old)) => {
                let suppressed = match (attr_schema.and_then(|a| a.diff_suppress), desired_value) {
                    (Some(suppress), Value::String(new)) => suppress(old, new),
                    _ => false,
                };
                if !suppressed {
                    changed.push(key.clone());
                }
            }
            _ => changed.push(key.clone()),
        }
    }

    changed
}

//! Resource and property introspection.
//!
//! Classes in a descriptor become queryable collections (`events`,
//! `name of events`, ...). The same data drives the zero-argument accessors
//! that are exposed alongside an application's commands.

use crate::descriptor::Descriptor;
use crate::naming::accessor_function_id;
use crate::registry::AccessorEntry;
use serde::Serialize;
use std::collections::BTreeMap;

/// Class that describes the application object itself.
pub const APPLICATION_CLASS: &str = "application";

/// Used when no `application` class lists any properties.
pub const DEFAULT_BASIC_PROPERTIES: &[&str] = &["name", "version", "frontmost"];

const GENERIC_NOTES: &[&str] = &[
    "Query a collection by its plural name, e.g. `windows`.",
    "Use `name of <collection>` to list just the names.",
    "Filter with `<collection> whose name contains \"text\"`.",
    "Address a single element with `first <class>` or `<class> 1`.",
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    pub app_name: String,
    pub basic_properties: Vec<String>,
    pub classes: Vec<String>,
    pub collections: Vec<String>,
    pub class_properties: BTreeMap<String, Vec<String>>,
    pub example_queries: Vec<String>,
    pub notes: Vec<String>,
}

/// English plural for a class name.
pub fn pluralize(name: &str) -> String {
    if name.ends_with('s') {
        format!("{name}es")
    } else if let Some(stem) = name.strip_suffix('y') {
        format!("{stem}ies")
    } else {
        format!("{name}s")
    }
}

/// Describe what can be queried on `app`.
///
/// Without a descriptor the answer is a generic fallback; this never fails.
pub fn describe_resources(app: &str, descriptor: Option<&Descriptor>) -> ResourceDescriptor {
    let mut resources = ResourceDescriptor {
        app_name: app.to_string(),
        notes: GENERIC_NOTES.iter().map(|note| note.to_string()).collect(),
        ..Default::default()
    };

    let Some(descriptor) = descriptor else {
        resources.basic_properties = default_basic_properties();
        resources.example_queries = resources
            .basic_properties
            .iter()
            .map(|property| property.to_string())
            .collect();
        return resources;
    };

    for class in descriptor.all_classes() {
        let properties: Vec<String> = class.properties.iter().map(|p| p.name.clone()).collect();
        if class.name == APPLICATION_CLASS {
            if resources.basic_properties.is_empty() {
                resources.basic_properties = properties;
            }
            continue;
        }
        if resources.classes.contains(&class.name) {
            continue;
        }
        let collection = class
            .explicit_plural()
            .map(str::to_string)
            .unwrap_or_else(|| pluralize(&class.name));

        resources.example_queries.push(collection.clone());
        resources.example_queries.push(format!("name of {collection}"));
        resources
            .example_queries
            .push(format!("{collection} whose name contains \"text\""));

        resources.classes.push(class.name.clone());
        resources.collections.push(collection);
        resources
            .class_properties
            .insert(class.name.clone(), properties);
    }

    if resources.basic_properties.is_empty() {
        resources.basic_properties = default_basic_properties();
    }
    resources
}

/// Zero-argument accessors for every collection and basic property.
pub fn derived_accessors(resources: &ResourceDescriptor) -> Vec<AccessorEntry> {
    let app = resources.app_name.as_str();
    let mut accessors = Vec::new();
    for collection in &resources.collections {
        accessors.push(AccessorEntry {
            app: app.to_string(),
            function_id: accessor_function_id(app, collection),
            query: collection.clone(),
            description: format!("Get all {collection} from {app}"),
        });
        accessors.push(AccessorEntry {
            app: app.to_string(),
            function_id: accessor_function_id(app, &format!("{collection}_names")),
            query: format!("name of {collection}"),
            description: format!("Get the names of all {collection} in {app}"),
        });
    }
    for property in &resources.basic_properties {
        accessors.push(AccessorEntry {
            app: app.to_string(),
            function_id: accessor_function_id(app, property),
            query: property.clone(),
            description: format!("Get the {property} of {app}"),
        });
    }
    accessors
}

fn default_basic_properties() -> Vec<String> {
    DEFAULT_BASIC_PROPERTIES
        .iter()
        .map(|property| property.to_string())
        .collect()
}

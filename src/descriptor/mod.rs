//! Descriptor ingestion.
//!
//! A descriptor is the JSON dump of one application's scripting dictionary.
//! `model` mirrors the file format, `schema` checks structure before
//! deserializing, and `store` reads a directory of them with partial-failure
//! semantics.

pub mod model;
pub mod schema;
pub mod store;

pub use model::{
    Class, Command, Descriptor, DirectParameter, Enumeration, Enumerator, Parameter, Property,
    Suite,
};
pub use schema::validate_descriptor_value;
pub use store::{DescriptorBatch, DescriptorError, DescriptorStore, load_descriptor};

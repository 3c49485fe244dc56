//! # rollout-schema — Schema Resolution & Structural Validation
//!
//! Validates raw rollout pipeline documents against versioned JSON Schemas
//! (Draft 2020-12) and chains structural validation with the semantic
//! checks from `rollout-core`.
//!
//! ## Components
//!
//! - [`SchemaRegistry`] — immutable reference → compiled schema map with a
//!   default reference. Built once via [`SchemaRegistryBuilder`] and shared.
//! - [`SchemaRegistry::resolve`] — picks the schema named by a document's
//!   `$schema` field, or the default.
//! - [`SchemaValidator`] — parses YAML/JSON bytes into a generic tree and
//!   validates it against the resolved schema.
//! - [`PipelineLoader`] — structural validation, typed deserialization,
//!   semantic validation, in that order.
//!
//! ## Crate Policy
//!
//! - Depends only on `rollout-core` internally.
//! - No network access: cross-schema `$ref`s resolve against the registry.
//! - Registered schema references are part of the document contract and
//!   must not be renamed once published.

pub mod error;
pub mod load;
pub mod registry;
pub mod validate;

pub use error::{SchemaError, ValidationViolations, Violation};
pub use load::{LoadError, PipelineLoader};
pub use registry::{
    CompiledSchema, SchemaRegistry, SchemaRegistryBuilder, DEFAULT_SCHEMA_REF, PIPELINE_SCHEMA_V1,
};
pub use validate::{parse_document, SchemaValidator};

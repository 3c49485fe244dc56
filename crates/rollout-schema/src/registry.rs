//! # Schema Registry
//!
//! Immutable mapping from schema reference (e.g. `pipeline.schema.v1`) to a
//! compiled JSON Schema, plus the reference applied to documents that do not
//! declare one.
//!
//! Registries are assembled with [`SchemaRegistryBuilder`] and never change
//! after [`SchemaRegistryBuilder::build`]. A built registry is `Send + Sync`
//! and is meant to be shared (`Arc<SchemaRegistry>`) by every validation
//! call in the process.
//!
//! ## Schema Resolution
//!
//! Documents select a schema with a top-level `$schema` string. An absent
//! (or `null`) `$schema` selects the default reference. Anything the
//! registry does not hold is rejected as unsupported.
//!
//! `$ref`s between registered schemas resolve locally: the retriever maps
//! the last path segment of the referenced URI to a registered reference, so
//! compilation never touches the network.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;

use crate::error::SchemaError;

/// Reference of the first pipeline schema version.
pub const PIPELINE_SCHEMA_V1: &str = "pipeline.schema.v1";

/// Reference applied to documents without a `$schema` field.
pub const DEFAULT_SCHEMA_REF: &str = PIPELINE_SCHEMA_V1;

/// Document field carrying the schema reference.
pub const SCHEMA_FIELD: &str = "$schema";

/// Schemas compiled into the crate.
const BUILTIN_SCHEMAS: &[(&str, &str)] = &[(
    PIPELINE_SCHEMA_V1,
    include_str!("../schemas/pipeline.schema.v1.json"),
)];

/// Resolves `$ref` URIs against the documents being registered.
struct LocalSchemaRetriever {
    documents: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let last = uri_str.rsplit('/').next().unwrap_or(uri_str);

        for key in [uri_str, last, last.trim_end_matches(".json")] {
            if let Some(value) = self.documents.get(key) {
                return Ok(value.clone());
            }
        }

        Err(format!("schema reference {uri_str} is not registered").into())
    }
}

/// A schema document together with its compiled validator.
pub struct CompiledSchema {
    reference: String,
    document: Value,
    pub(crate) validator: Validator,
}

impl CompiledSchema {
    /// The reference this schema is registered under.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The raw schema document.
    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}

/// Immutable set of compiled schemas keyed by reference.
#[derive(Debug)]
pub struct SchemaRegistry {
    default_reference: String,
    schemas: BTreeMap<String, CompiledSchema>,
}

impl SchemaRegistry {
    /// Start assembling a registry.
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    /// The registry of schemas embedded in this crate, defaulting to
    /// [`DEFAULT_SCHEMA_REF`].
    ///
    /// # Errors
    ///
    /// Only if an embedded schema fails to parse or compile.
    pub fn builtin() -> Result<Self, SchemaError> {
        SchemaRegistryBuilder::with_builtin()?.build()
    }

    /// Look up a compiled schema.
    pub fn get(&self, reference: &str) -> Option<&CompiledSchema> {
        self.schemas.get(reference)
    }

    /// Whether `reference` is registered.
    pub fn contains(&self, reference: &str) -> bool {
        self.schemas.contains_key(reference)
    }

    /// The reference applied when a document declares none.
    pub fn default_reference(&self) -> &str {
        &self.default_reference
    }

    /// Registered references in sorted order.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True if no schema is registered. Never the case for a built
    /// registry, which always holds its default.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Select the schema a raw document must conform to.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnsupportedSchema`] when the declared reference is not
    /// registered or is not a string.
    pub fn resolve(&self, document: &Value) -> Result<&CompiledSchema, SchemaError> {
        let reference = match document.get(SCHEMA_FIELD) {
            None | Some(Value::Null) => self.default_reference.as_str(),
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(SchemaError::UnsupportedSchema(other.to_string())),
        };

        let schema = self
            .get(reference)
            .ok_or_else(|| SchemaError::UnsupportedSchema(reference.to_string()))?;

        tracing::trace!(schema = reference, "resolved pipeline schema");
        Ok(schema)
    }
}

/// Collects schema documents and compiles them into a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    default_reference: Option<String>,
    documents: BTreeMap<String, Value>,
}

impl SchemaRegistryBuilder {
    /// An empty builder. The default reference is [`DEFAULT_SCHEMA_REF`]
    /// unless overridden.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-loaded with the embedded schemas.
    ///
    /// # Errors
    ///
    /// [`SchemaError::SchemaLoad`] if an embedded schema is not valid JSON.
    pub fn with_builtin() -> Result<Self, SchemaError> {
        let mut builder = Self::new();
        for (reference, source) in BUILTIN_SCHEMAS {
            let document: Value =
                serde_json::from_str(source).map_err(|e| SchemaError::SchemaLoad {
                    reference: (*reference).to_string(),
                    reason: format!("invalid JSON: {e}"),
                })?;
            builder = builder.register(*reference, document);
        }
        Ok(builder)
    }

    /// Register a schema document, replacing any earlier one with the same
    /// reference.
    pub fn register(mut self, reference: impl Into<String>, document: Value) -> Self {
        self.documents.insert(reference.into(), document);
        self
    }

    /// Override the default reference.
    pub fn default_reference(mut self, reference: impl Into<String>) -> Self {
        self.default_reference = Some(reference.into());
        self
    }

    /// Register every `*.json` file in `dir`, keyed by file name without the
    /// `.json` suffix (`pipeline.schema.v2.json` → `pipeline.schema.v2`).
    ///
    /// # Errors
    ///
    /// [`SchemaError::SchemaLoad`] if the directory or a schema file cannot
    /// be read, or a file is not valid JSON.
    pub fn load_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| SchemaError::SchemaLoad {
            reference: dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        for entry in entries {
            let path = entry
                .map_err(|e| SchemaError::SchemaLoad {
                    reference: dir.display().to_string(),
                    reason: format!("cannot read schema directory: {e}"),
                })?
                .path();
            let Some(reference) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
            else {
                continue;
            };
            if !path.is_file() {
                continue;
            }

            let content =
                std::fs::read_to_string(&path).map_err(|e| SchemaError::SchemaLoad {
                    reference: reference.to_string(),
                    reason: format!("cannot read {}: {e}", path.display()),
                })?;
            let document: Value =
                serde_json::from_str(&content).map_err(|e| SchemaError::SchemaLoad {
                    reference: reference.to_string(),
                    reason: format!("invalid JSON: {e}"),
                })?;

            tracing::debug!(schema = reference, path = %path.display(), "registered schema from directory");
            self.documents.insert(reference.to_string(), document);
        }

        Ok(self)
    }

    fn options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(LocalSchemaRetriever {
            documents: self
                .documents
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        });
        opts
    }

    /// Compile every registered document.
    ///
    /// # Errors
    ///
    /// [`SchemaError::SchemaCompile`] for a document that is not a valid
    /// schema, [`SchemaError::UnsupportedSchema`] if the default reference
    /// was never registered.
    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        let default_reference = self
            .default_reference
            .clone()
            .unwrap_or_else(|| DEFAULT_SCHEMA_REF.to_string());
        if !self.documents.contains_key(&default_reference) {
            return Err(SchemaError::UnsupportedSchema(default_reference));
        }

        let opts = self.options();
        let mut schemas = BTreeMap::new();
        for (reference, document) in self.documents {
            let validator = opts
                .build(&document)
                .map_err(|e| SchemaError::SchemaCompile {
                    reference: reference.clone(),
                    reason: e.to_string(),
                })?;
            schemas.insert(
                reference.clone(),
                CompiledSchema {
                    reference,
                    document,
                    validator,
                },
            );
        }

        tracing::debug!(
            schemas = schemas.len(),
            default = %default_reference,
            "schema registry built"
        );
        Ok(SchemaRegistry {
            default_reference,
            schemas,
        })
    }
}

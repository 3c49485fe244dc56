//! # Structural Validation
//!
//! Validates raw pipeline documents against the schema they resolve to,
//! before any typed deserialization happens.
//!
//! Documents arrive as bytes (YAML, or JSON as a YAML subset) and are parsed
//! into a generic `serde_json::Value` tree. The tree is the only input to
//! the schema layer; the typed model is built from it afterwards.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{SchemaError, ValidationViolations, Violation};
use crate::registry::{CompiledSchema, SchemaRegistry};

impl CompiledSchema {
    /// Validate a document tree against this schema.
    ///
    /// # Errors
    ///
    /// [`SchemaError::NotCompliant`] listing every violation, sorted.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            schema = self.reference(),
            violations = violations.len(),
            "pipeline document rejected by schema"
        );
        Err(SchemaError::NotCompliant {
            reference: self.reference().to_string(),
            violations: ValidationViolations::new(violations),
        })
    }
}

/// Structural validator over a shared [`SchemaRegistry`].
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    registry: Arc<SchemaRegistry>,
}

impl SchemaValidator {
    /// A validator resolving documents against `registry`.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Validate serialized document bytes.
    ///
    /// # Errors
    ///
    /// [`SchemaError::DocumentParse`], [`SchemaError::UnsupportedSchema`] or
    /// [`SchemaError::NotCompliant`], in that order of detection.
    pub fn validate_schema(&self, bytes: &[u8]) -> Result<(), SchemaError> {
        self.checked_document(bytes).map(drop)
    }

    /// Parse and validate document bytes, returning the validated tree.
    pub fn checked_document(&self, bytes: &[u8]) -> Result<Value, SchemaError> {
        let document = parse_document(bytes)?;
        self.validate_document(&document)?;
        Ok(document)
    }

    /// Validate an already-parsed document tree against the schema it
    /// declares (or the default).
    pub fn validate_document(&self, document: &Value) -> Result<(), SchemaError> {
        self.registry.resolve(document)?.validate(document)
    }
}

/// Parse YAML or JSON bytes into a generic document tree.
///
/// # Errors
///
/// [`SchemaError::DocumentParse`] for invalid YAML, or YAML constructs with
/// no JSON equivalent (non-scalar map keys, non-finite floats).
pub fn parse_document(bytes: &[u8]) -> Result<Value, SchemaError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_slice(bytes).map_err(|e| SchemaError::DocumentParse(e.to_string()))?;
    yaml_to_json_value(&yaml).map_err(SchemaError::DocumentParse)
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Scalar map keys are stringified; YAML tags are dropped.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(u.into()))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

//! # Schema Errors
//!
//! Failures of schema registry construction, schema resolution, and
//! structural validation. Compliance failures carry one [`Violation`] per
//! structural complaint so authors can locate the defect.

use std::fmt;

use thiserror::Error;

/// Error from the schema layer.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The document names a schema reference the registry does not hold.
    #[error("unsupported schema reference: {0}")]
    UnsupportedSchema(String),

    /// The document does not conform to its resolved schema.
    #[error("pipeline is not compliant with schema {reference}:\n{violations}")]
    NotCompliant {
        /// Reference of the schema validated against.
        reference: String,
        /// Structural violations, sorted by instance path.
        violations: ValidationViolations,
    },

    /// The document bytes are not valid YAML or JSON.
    #[error("failed to parse pipeline document: {0}")]
    DocumentParse(String),

    /// A schema document could not be read or parsed.
    #[error("schema load error for '{reference}': {reason}")]
    SchemaLoad {
        /// Schema reference or file name.
        reference: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// A schema document was read but does not compile.
    #[error("failed to compile schema '{reference}': {reason}")]
    SchemaCompile {
        /// Schema reference.
        reference: String,
        /// Compiler diagnostic.
        reason: String,
    },
}

/// A single structural violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating value in the document.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that rejected it.
    pub schema_path: String,
    /// Human-readable complaint.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Ordered collection of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Sort violations by instance path, then message, then schema path.
    pub(crate) fn new(mut violations: Vec<Violation>) -> Self {
        violations.sort_by(|a, b| {
            (&a.instance_path, &a.message, &a.schema_path).cmp(&(
                &b.instance_path,
                &b.message,
                &b.schema_path,
            ))
        });
        Self { violations }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations, in sorted order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(path: &str, message: &str) -> Violation {
        Violation {
            instance_path: path.to_string(),
            schema_path: String::new(),
            message: message.to_string(),
        }
    }

    #[test]
    fn violation_display_root() {
        let v = violation("", r#""rolloutName" is a required property"#);
        assert_eq!(v.to_string(), r#"  (root): "rolloutName" is a required property"#);
    }

    #[test]
    fn violations_are_sorted() {
        let vs = ValidationViolations::new(vec![
            violation("/resourceGroups/1", "b"),
            violation("/resourceGroups/0/steps/0", "z"),
            violation("/resourceGroups/0/steps/0", "a"),
        ]);
        let paths: Vec<(&str, &str)> = vs
            .violations()
            .iter()
            .map(|v| (v.instance_path.as_str(), v.message.as_str()))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("/resourceGroups/0/steps/0", "a"),
                ("/resourceGroups/0/steps/0", "z"),
                ("/resourceGroups/1", "b"),
            ]
        );
    }

    #[test]
    fn not_compliant_message_leads_with_reference() {
        let err = SchemaError::NotCompliant {
            reference: "pipeline.schema.v1".to_string(),
            violations: ValidationViolations::new(vec![violation(
                "/resourceGroups/0/steps/0",
                r#""command" is a required property"#,
            )]),
        };
        assert_eq!(
            err.to_string(),
            "pipeline is not compliant with schema pipeline.schema.v1:\n  \
             /resourceGroups/0/steps/0: \"command\" is a required property"
        );
    }

    #[test]
    fn unsupported_schema_message() {
        assert_eq!(
            SchemaError::UnsupportedSchema("invalid".to_string()).to_string(),
            "unsupported schema reference: invalid"
        );
    }
}

//! # Error Types — Semantic Validation Failures
//!
//! Every error here is terminal for the validation call that produced it.
//! Messages are surfaced to pipeline authors verbatim, so their wording is
//! part of the public contract.

use std::fmt;

use thiserror::Error;

/// A required scalar field of the pipeline model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredField {
    /// `resourceGroups[].name`
    ResourceGroupName,
    /// `resourceGroups[].subscription`
    Subscription,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceGroupName => f.write_str("resource group name"),
            Self::Subscription => f.write_str("subscription"),
        }
    }
}

/// Semantic validation error for a typed [`Pipeline`](crate::Pipeline).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A required field is empty.
    #[error("{0} is required")]
    MissingField(RequiredField),

    /// Two steps share a name. Step names form one namespace across all
    /// resource groups.
    #[error("duplicate step name {0:?}")]
    DuplicateStepName(String),

    /// A step depends on a name that no step in the pipeline carries.
    #[error("invalid dependency on step {step}: dependency {dependency} does not exist")]
    DanglingDependency {
        /// The step declaring the dependency.
        step: String,
        /// The unresolved dependency name.
        dependency: String,
    },
}

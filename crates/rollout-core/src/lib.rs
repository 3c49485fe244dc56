//! # rollout-core — Pipeline Model & Semantic Validation
//!
//! Defines the typed rollout pipeline (`Pipeline → ResourceGroup → Step`)
//! and the semantic checks that run on it once a document has passed
//! structural validation.
//!
//! ## Semantic Invariants
//!
//! - Every resource group carries a non-empty name and subscription.
//! - Step names form a single namespace across the whole pipeline.
//! - Every `dependsOn` entry names a step declared somewhere in the
//!   pipeline, in any resource group, before or after the dependent step.
//!
//! Validation is first-error-wins in a fixed order, so a given pipeline
//! always yields the same message.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rollout-*` crates (this is the leaf).
//! - No I/O. Validation never mutates the model.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod pipeline;
pub mod validate;

pub use error::{PipelineError, RequiredField};
pub use pipeline::{
    Action, ArmAction, DeploymentLevel, Pipeline, ResourceGroup, ShellAction, Step, Variable,
};

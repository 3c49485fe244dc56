//! # Semantic Validation
//!
//! Domain checks on the typed model, run after structural validation.
//! Checks execute in a fixed order and the first violation is returned:
//!
//! 1. Every resource group has a name, then a subscription.
//! 2. Step names are unique across the whole pipeline.
//! 3. Every `dependsOn` entry names a step declared somewhere in the
//!    pipeline. Runs only once the full name set is known, so forward
//!    references across groups are valid.
//!
//! Dependency cycles are not detected here.

use std::collections::HashSet;

use crate::error::{PipelineError, RequiredField};
use crate::pipeline::{Pipeline, ResourceGroup};

impl ResourceGroup {
    /// Check the group's required fields.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingField`] for an empty name, then for an empty
    /// subscription.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.name.is_empty() {
            return Err(PipelineError::MissingField(RequiredField::ResourceGroupName));
        }
        if self.subscription.is_empty() {
            return Err(PipelineError::MissingField(RequiredField::Subscription));
        }
        Ok(())
    }
}

impl Pipeline {
    /// Validate the pipeline's semantics.
    ///
    /// # Errors
    ///
    /// Returns the first violation found; see the module docs for the order.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for rg in &self.resource_groups {
            rg.validate()?;
        }

        let names = self.step_names()?;

        for (_, step) in self.steps() {
            if let Some(missing) = step.depends_on.iter().find(|d| !names.contains(d.as_str())) {
                return Err(PipelineError::DanglingDependency {
                    step: step.name.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        tracing::debug!(
            resource_groups = self.resource_groups.len(),
            steps = names.len(),
            "pipeline semantics valid"
        );
        Ok(())
    }

    /// The global step-name set, failing on the first repeated name.
    fn step_names(&self) -> Result<HashSet<&str>, PipelineError> {
        let mut names = HashSet::with_capacity(self.step_count());
        for (_, step) in self.steps() {
            if !names.insert(step.name.as_str()) {
                return Err(PipelineError::DuplicateStepName(step.name.clone()));
            }
        }
        Ok(names)
    }
}

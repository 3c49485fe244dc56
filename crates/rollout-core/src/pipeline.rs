//! # Pipeline Model
//!
//! Typed representation of a rollout pipeline definition:
//! `Pipeline → ResourceGroup → Step`. Values of these types are built by
//! deserializing a document that already passed structural validation, or
//! directly by callers that assemble pipelines in code.
//!
//! Field names on the wire are camelCase (`serviceGroup`, `dependsOn`, ...).
//! The step action is an internally tagged enum keyed by `action`.

use serde::{Deserialize, Serialize};

/// A rollout pipeline: an ordered list of resource groups.
///
/// Step names are unique across the whole pipeline, not per resource
/// group. See [`Pipeline::validate`](crate::Pipeline::validate).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    /// Declared schema reference, if any.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Service group the rollout belongs to.
    #[serde(default)]
    pub service_group: String,
    /// Human-readable rollout name.
    #[serde(default)]
    pub rollout_name: String,
    /// Resource groups in declaration order.
    #[serde(default)]
    pub resource_groups: Vec<ResourceGroup>,
}

/// A named, subscription-scoped collection of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    /// Resource group name. Required.
    #[serde(default)]
    pub name: String,
    /// Subscription identifier. Required.
    #[serde(default)]
    pub subscription: String,
    /// Optional AKS cluster the group's steps target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aks_cluster: Option<String>,
    /// Steps in declaration order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A single unit of deployment work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Step name, unique within the pipeline.
    pub name: String,
    /// What the step does.
    #[serde(flatten)]
    pub action: Action,
    /// Names of steps that must complete before this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// Step action, discriminated by the `action` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Action {
    /// Run a shell command.
    Shell(ShellAction),
    /// Deploy an ARM template.
    #[serde(rename = "ARM")]
    Arm(ArmAction),
}

impl Action {
    /// The wire discriminator for this action.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Shell(_) => "Shell",
            Self::Arm(_) => "ARM",
        }
    }
}

/// A shell command step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellAction {
    /// Command line passed to the shell.
    pub command: String,
    /// Environment variables exported to the command.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
}

/// An environment variable for a shell step.
///
/// Either a literal `value` or a `configRef` naming a configuration key the
/// executor resolves at run time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Variable name as exported to the environment.
    pub name: String,
    /// Configuration key to resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_ref: Option<String>,
    /// Literal value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// An ARM template deployment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmAction {
    /// Path to the template file.
    pub template: String,
    /// Path to the parameters file.
    pub parameters: String,
    /// Scope of the deployment.
    pub deployment_level: DeploymentLevel,
}

/// Scope an ARM deployment is submitted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeploymentLevel {
    /// Deploy into the step's resource group.
    ResourceGroup,
    /// Deploy at subscription scope.
    Subscription,
}

impl Step {
    /// A shell step with no dependencies.
    pub fn shell(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: Action::Shell(ShellAction {
                command: command.into(),
                variables: Vec::new(),
            }),
            depends_on: Vec::new(),
        }
    }

    /// An ARM deployment step with no dependencies.
    pub fn arm(
        name: impl Into<String>,
        template: impl Into<String>,
        parameters: impl Into<String>,
        deployment_level: DeploymentLevel,
    ) -> Self {
        Self {
            name: name.into(),
            action: Action::Arm(ArmAction {
                template: template.into(),
                parameters: parameters.into(),
                deployment_level,
            }),
            depends_on: Vec::new(),
        }
    }

    /// Replace this step's dependencies.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }
}

impl ResourceGroup {
    /// A resource group with no cluster and no steps.
    pub fn new(name: impl Into<String>, subscription: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscription: subscription.into(),
            aks_cluster: None,
            steps: Vec::new(),
        }
    }

    /// Set the AKS cluster.
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.aks_cluster = Some(cluster.into());
        self
    }

    /// Append a step.
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

impl Pipeline {
    /// All steps paired with their owning resource group, in declaration
    /// order: groups first, then steps within each group.
    pub fn steps(&self) -> impl Iterator<Item = (&ResourceGroup, &Step)> {
        self.resource_groups
            .iter()
            .flat_map(|rg| rg.steps.iter().map(move |step| (rg, step)))
    }

    /// Find a step by name anywhere in the pipeline.
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps().map(|(_, step)| step).find(|s| s.name == name)
    }

    /// Total number of steps across all resource groups.
    pub fn step_count(&self) -> usize {
        self.resource_groups.iter().map(|rg| rg.steps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
$schema: pipeline.schema.v1
serviceGroup: Microsoft.Azure.ARO.HCP.Test
rolloutName: Test Rollout
resourceGroups:
  - name: regional
    subscription: sub-1
    steps:
      - name: deploy
        action: ARM
        template: templates/region.bicep
        parameters: configurations/region.bicepparam
        deploymentLevel: ResourceGroup
  - name: mgmt
    subscription: sub-1
    aksCluster: mgmt-cluster
    steps:
      - name: install
        action: Shell
        command: make deploy
        variables:
          - name: REGION
            configRef: region
          - name: DRY_RUN
            value: "false"
        dependsOn:
          - deploy
"#;

    #[test]
    fn deserialize_full_document() {
        let pipeline: Pipeline = serde_yaml::from_str(DOC).unwrap();
        assert_eq!(pipeline.schema.as_deref(), Some("pipeline.schema.v1"));
        assert_eq!(pipeline.service_group, "Microsoft.Azure.ARO.HCP.Test");
        assert_eq!(pipeline.resource_groups.len(), 2);

        let deploy = pipeline.step("deploy").unwrap();
        assert_eq!(
            deploy.action,
            Action::Arm(ArmAction {
                template: "templates/region.bicep".to_string(),
                parameters: "configurations/region.bicepparam".to_string(),
                deployment_level: DeploymentLevel::ResourceGroup,
            })
        );

        let install = pipeline.step("install").unwrap();
        assert_eq!(install.depends_on, vec!["deploy".to_string()]);
        match &install.action {
            Action::Shell(shell) => {
                assert_eq!(shell.command, "make deploy");
                assert_eq!(shell.variables.len(), 2);
                assert_eq!(shell.variables[0].config_ref.as_deref(), Some("region"));
                assert_eq!(shell.variables[1].value.as_deref(), Some("false"));
            }
            other => panic!("expected shell action, got {}", other.kind()),
        }
        assert_eq!(
            pipeline.resource_groups[1].aks_cluster.as_deref(),
            Some("mgmt-cluster")
        );
    }

    #[test]
    fn serialize_uses_wire_names() {
        let pipeline = Pipeline {
            resource_groups: vec![ResourceGroup::new("rg", "sub")
                .with_step(Step::shell("a", "true").with_dependencies(["b"]))],
            ..Pipeline::default()
        };
        let json = serde_json::to_value(&pipeline).unwrap();
        let step = &json["resourceGroups"][0]["steps"][0];
        assert_eq!(step["action"], "Shell");
        assert_eq!(step["command"], "true");
        assert_eq!(step["dependsOn"][0], "b");
        assert!(json.get("$schema").is_none());
        assert!(json["resourceGroups"][0].get("aksCluster").is_none());
    }

    #[test]
    fn steps_iterate_in_declaration_order() {
        let pipeline = Pipeline {
            resource_groups: vec![
                ResourceGroup::new("rg1", "sub")
                    .with_step(Step::shell("a", "true"))
                    .with_step(Step::shell("b", "true")),
                ResourceGroup::new("rg2", "sub").with_step(Step::shell("c", "true")),
            ],
            ..Pipeline::default()
        };
        let order: Vec<(&str, &str)> = pipeline
            .steps()
            .map(|(rg, s)| (rg.name.as_str(), s.name.as_str()))
            .collect();
        assert_eq!(order, vec![("rg1", "a"), ("rg1", "b"), ("rg2", "c")]);
        assert_eq!(pipeline.step_count(), 3);
        assert!(pipeline.step("missing").is_none());
    }

    #[test]
    fn action_kind_matches_wire_tag() {
        assert_eq!(Step::shell("s", "ls").action.kind(), "Shell");
        assert_eq!(
            Step::arm("a", "t", "p", DeploymentLevel::Subscription).action.kind(),
            "ARM"
        );
    }
}

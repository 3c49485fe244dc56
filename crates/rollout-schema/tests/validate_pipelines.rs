//! Integration test: schema resolution, structural validation, and full
//! loading of pipeline documents through the public API.

use std::sync::Arc;

use proptest::prelude::*;
use rollout_core::{Pipeline, ResourceGroup, Step};
use rollout_schema::{
    LoadError, PipelineLoader, SchemaError, SchemaRegistry, SchemaRegistryBuilder,
    DEFAULT_SCHEMA_REF, PIPELINE_SCHEMA_V1,
};
use serde_json::{json, Value};

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::builtin().expect("builtin schemas compile"))
}

fn shell_pipeline(step: Value) -> Value {
    json!({
        "serviceGroup": "test",
        "rolloutName": "test",
        "resourceGroups": [{
            "name": "rg",
            "subscription": "sub",
            "aksCluster": "aks",
            "steps": [step]
        }]
    })
}

#[test]
fn test_get_schema_for_pipeline() {
    let registry = registry();

    let cases: Vec<(&str, Value, Result<&str, &str>)> = vec![
        ("default schema", json!({}), Ok(DEFAULT_SCHEMA_REF)),
        (
            "explicit schema",
            json!({ "$schema": PIPELINE_SCHEMA_V1 }),
            Ok(PIPELINE_SCHEMA_V1),
        ),
        (
            "invalid schema",
            json!({ "$schema": "invalid" }),
            Err("unsupported schema reference: invalid"),
        ),
    ];

    for (name, document, expected) in cases {
        let result = registry.resolve(&document);
        match expected {
            Ok(reference) => {
                let schema = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e}"));
                assert_eq!(schema.reference(), reference, "{name}");
            }
            Err(message) => {
                let err = result.err().unwrap_or_else(|| panic!("{name}: expected error"));
                assert_eq!(err.to_string(), message, "{name}");
            }
        }
    }
}

#[test]
fn test_validate_pipeline_schema() {
    let loader = PipelineLoader::new(registry());

    let valid = shell_pipeline(json!({
        "name": "step",
        "action": "Shell",
        "command": "echo hello"
    }));
    let bytes = serde_yaml::to_string(&valid).unwrap();
    loader.validate_schema(bytes.as_bytes()).unwrap();

    let invalid = shell_pipeline(json!({
        "name": "step",
        "action": "Shell"
    }));
    let bytes = serde_yaml::to_string(&invalid).unwrap();
    let err = loader.validate_schema(bytes.as_bytes()).unwrap_err();
    assert!(
        err.to_string()
            .contains("pipeline is not compliant with schema pipeline.schema.v1"),
        "got: {err}"
    );
}

#[test]
fn test_shared_registry_across_threads() {
    let loader = PipelineLoader::new(registry());
    let doc = serde_yaml::to_string(&shell_pipeline(json!({
        "name": "step",
        "action": "Shell",
        "command": "true"
    })))
    .unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let pipeline = loader.load(doc.as_bytes()).unwrap();
                assert_eq!(pipeline.step_count(), 1);
            });
        }
    });
}

#[test]
fn test_versioned_schema_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("pipeline.schema.v2.json"),
        serde_json::to_string(&json!({
            "type": "object",
            "required": ["serviceGroup", "rolloutName", "resourceGroups", "owner"],
            "properties": { "owner": { "type": "string" } }
        }))
        .unwrap(),
    )
    .unwrap();

    let registry = SchemaRegistryBuilder::with_builtin()
        .unwrap()
        .load_dir(dir.path())
        .unwrap()
        .build()
        .unwrap();
    let loader = PipelineLoader::new(Arc::new(registry));

    let mut doc = shell_pipeline(json!({ "name": "s", "action": "Shell", "command": "true" }));
    doc["$schema"] = json!("pipeline.schema.v2");
    let err = loader
        .validate_schema(serde_json::to_string(&doc).unwrap().as_bytes())
        .unwrap_err();
    assert!(
        err.to_string()
            .starts_with("pipeline is not compliant with schema pipeline.schema.v2"),
        "got: {err}"
    );

    doc["owner"] = json!("team-rollout");
    loader
        .validate_schema(serde_json::to_string(&doc).unwrap().as_bytes())
        .unwrap();
}

#[test]
fn test_load_reports_semantic_error_after_schema_passes() {
    let loader = PipelineLoader::new(registry());
    let doc = r#"
serviceGroup: test
rolloutName: test
resourceGroups:
  - name: rg1
    subscription: sub1
    steps:
      - name: step1
        action: Shell
        command: "true"
  - name: rg2
    subscription: sub1
    steps:
      - name: step2
        action: Shell
        command: "true"
        dependsOn: [step3]
"#;
    let err = loader.load(doc.as_bytes()).unwrap_err();
    assert!(matches!(err, LoadError::Semantic(_)));
    assert_eq!(
        err.to_string(),
        "invalid dependency on step step2: dependency step3 does not exist"
    );
}

#[test]
fn test_unsupported_schema_wins_over_structure() {
    let loader = PipelineLoader::new(registry());
    let err = loader
        .load(br#"{"$schema": "pipeline.schema.v9", "bogus": true}"#)
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Schema(SchemaError::UnsupportedSchema(ref r)) if r == "pipeline.schema.v9"
    ));
}

/// Pipelines with distinct step names whose dependencies all resolve.
fn valid_pipeline() -> impl Strategy<Value = Pipeline> {
    prop::collection::vec(1usize..4, 1..4).prop_flat_map(|sizes| {
        let total: usize = sizes.iter().sum();
        prop::collection::vec(prop::collection::vec(0..total, 0..3), total).prop_map(
            move |deps| {
                let mut index = 0;
                let resource_groups = sizes
                    .iter()
                    .enumerate()
                    .map(|(g, size)| {
                        let mut rg = ResourceGroup::new(format!("rg{g}"), "sub");
                        for _ in 0..*size {
                            rg.steps.push(
                                Step::shell(format!("step{index}"), "echo ok")
                                    .with_dependencies(deps[index].iter().map(|d| format!("step{d}"))),
                            );
                            index += 1;
                        }
                        rg
                    })
                    .collect();
                Pipeline {
                    schema: None,
                    service_group: "svc".to_string(),
                    rollout_name: "rollout".to_string(),
                    resource_groups,
                }
            },
        )
    })
}

proptest! {
    /// A typed pipeline that passes semantic validation, once serialized,
    /// passes both phases and loads back into the same model.
    #[test]
    fn loaded_pipeline_matches_source(pipeline in valid_pipeline()) {
        let loader = PipelineLoader::new(registry());
        let yaml = serde_yaml::to_string(&pipeline).unwrap();
        let loaded = loader.load(yaml.as_bytes()).unwrap();
        prop_assert_eq!(loaded, pipeline);
    }
}

//! End-to-end test: compiled templates invoked from sequential and parallel stages.

use crate::init_tracing;
use argo_dsl::argo_types::{ParallelSteps, Parameter, Sequence};
use argo_dsl::{
    decode_opaque, default_resolve_arguments, item_field, CallArguments, CompiledTemplate,
    DslError, ScriptFlavor, ScriptTemplateBuilder, TaskStep, TaskSteps,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn echo_template() -> CompiledTemplate {
    let source = r#"
def echo(msg: str, count: int = 1):
    """
    for i in $(seq $count); do echo "$msg"; done
    """
"#;
    ScriptTemplateBuilder::from_source(ScriptFlavor::Bash, source)
        .unwrap()
        .with_image("bash:5")
        .compile()
        .unwrap()
}

fn report_template() -> CompiledTemplate {
    let source = r#"
def report(data: dict, verbose: bool = False):
    """print(data, verbose)"""
"#;
    ScriptTemplateBuilder::from_source(ScriptFlavor::Python, source)
        .unwrap()
        .with_image("python:3.12")
        .compile()
        .unwrap()
}

fn serialize(
    steps: &TaskSteps,
    templates: &[&CompiledTemplate],
) -> Result<Vec<ParallelSteps>, DslError> {
    steps.to_parallel_steps(|name| templates.iter().copied().find(|t| t.name() == name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn pipeline_stages_serialize_in_order() {
    init_tracing();
    let echo = echo_template();
    let report = report_template();

    let s1 = echo.step("s1").call(CallArguments::new().with("msg", "hello").with("count", 3));
    let s2 = echo.step("s2").call(CallArguments::new().with("msg", s1.outputs_result()));
    let s3 = echo.step("s3").batch_call(vec![
        CallArguments::new().with("msg", "a"),
        CallArguments::new().with("msg", "b").with("count", 2),
    ]);
    let s4 = report
        .step("s4")
        .call(CallArguments::new().with("data", json!({"k": [1, 2]})))
        .when(format!("{} == Succeeded", s2.status()));

    let mut steps = TaskSteps::new();
    steps.add(s1);
    steps.parallel(|p| {
        p.add(s2);
        p.add(s3);
    });
    steps.add(s4);

    let names: Vec<Vec<&str>> = steps
        .stages()
        .iter()
        .map(|stage| stage.iter().map(TaskStep::name).collect())
        .collect();
    assert_eq!(names, vec![vec!["s1"], vec!["s2", "s3"], vec!["s4"]]);

    let stages = serialize(&steps, &[&echo, &report]).unwrap();
    let rendered = serde_json::to_value(&stages).unwrap();

    let data = rendered[2][0]["arguments"]["parameters"][0]["value"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(decode_opaque(&data), Some(json!({"k": [1, 2]})));

    assert_eq!(
        rendered,
        json!([
            [{
                "name": "s1",
                "template": "echo",
                "arguments": {"parameters": [
                    {"name": "msg", "value": "hello"},
                    {"name": "count", "value": "3"}
                ]}
            }],
            [
                {
                    "name": "s2",
                    "template": "echo",
                    "arguments": {"parameters": [
                        {"name": "msg", "value": "{{steps.s1.outputs.result}}"}
                    ]}
                },
                {
                    "name": "s3",
                    "template": "echo",
                    "arguments": {"parameters": [
                        {"name": "msg", "value": "{{item.msg}}"},
                        {"name": "count", "value": "{{item.count}}"}
                    ]},
                    "withItems": [{"msg": "a"}, {"msg": "b", "count": "2"}]
                }
            ],
            [{
                "name": "s4",
                "template": "report",
                "arguments": {"parameters": [{"name": "data", "value": data}]},
                "when": "{{steps.s2.status}} == Succeeded"
            }]
        ])
    );
}

#[test]
fn stages_render_as_yaml() {
    init_tracing();
    let echo = echo_template();

    let mut steps = TaskSteps::new();
    steps.add(
        echo.step("loop")
            .call(CallArguments::new().with("msg", item_field("n")))
            .batch_call("{{steps.gen.outputs.result}}"),
    );
    steps.add(
        echo.step("count")
            .call(CallArguments::new().with("msg", "{{item}}"))
            .sequence(Sequence::count(3).with_start(1)),
    );

    let stages = serialize(&steps, &[&echo]).unwrap();
    let yaml = argo_dsl::render::to_yaml(&stages).unwrap();
    let expected = r#"
- - name: loop
    template: echo
    arguments:
      parameters:
      - name: msg
        value: '{{item.n}}'
    withParam: '{{steps.gen.outputs.result}}'
- - name: count
    template: echo
    arguments:
      parameters:
      - name: msg
        value: '{{item}}'
    withSequence:
      count: 3
      start: 1
"#;
    let rendered: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let expected: serde_yaml::Value = serde_yaml::from_str(expected).unwrap();
    assert_eq!(rendered, expected);
}

#[test]
fn step_tokens_name_engine_placeholders() {
    let step = echo_template().step("build");

    assert_eq!(step.id(), "{{steps.build.id}}");
    assert_eq!(step.ip(), "{{steps.build.ip}}");
    assert_eq!(step.status(), "{{steps.build.status}}");
    assert_eq!(step.exit_code(), "{{steps.build.exitCode}}");
    assert_eq!(step.started_at(), "{{steps.build.startedAt}}");
    assert_eq!(step.finished_at(), "{{steps.build.finishedAt}}");
    assert_eq!(step.outputs_result(), "{{steps.build.outputs.result}}");
    assert_eq!(step.outputs_parameters(), "{{steps.build.outputs.parameters}}");
    assert_eq!(
        step.outputs_artifacts().field("bundle"),
        "{{steps.build.outputs.artifacts.bundle}}"
    );
}

#[test]
fn unknown_template_is_reported() {
    init_tracing();
    let echo = echo_template();

    let mut steps = TaskSteps::new();
    steps.add(echo.step("ok"));
    steps.add(TaskStep::new("orphan", "missing"));

    match serialize(&steps, &[&echo]) {
        Err(DslError::UnknownTemplate(name)) => assert_eq!(name, "missing"),
        other => panic!("Expected unknown template, got {:?}", other),
    }
}

#[test]
fn declared_types_shape_arguments() {
    init_tracing();
    let report = report_template();
    let args = CallArguments::new()
        .with("data", json!(["x"]))
        .with("verbose", true);

    let declared = report.resolve_arguments(&args).unwrap();
    assert_eq!(declared[1], Parameter::new("verbose").with_value("True"));
    assert_eq!(
        decode_opaque(declared[0].value.as_deref().unwrap()),
        Some(json!(["x"]))
    );

    // Without declarations the value's own category decides
    let undeclared = default_resolve_arguments(
        &CallArguments::new().with("n", 2.0).with("s", "text").with("flag", false),
    )
    .unwrap();
    assert_eq!(
        undeclared,
        vec![
            Parameter::new("n").with_value("2.0"),
            Parameter::new("s").with_value("text"),
            Parameter::new("flag").with_value("False"),
        ]
    );
}

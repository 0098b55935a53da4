//! End-to-end test: Python function source to rendered Argo templates.

use crate::init_tracing;
use argo_dsl::argo_types::{Parameter, ValueFrom};
use argo_dsl::{
    force_image, CompiledTemplate, ScriptFlavor, ScriptTemplateBuilder, TemplateBuilder,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TASK_SOURCE: &str = r#"
@bash
def task(
    v1: str,
    v2="123",
    v3: Literal["1", "2", "3"] = "2",
    v4: ValueFrom = ValueFrom(default="123"),
):
    """
    echo $v1 $v2
    echo $v3 $v4
    """
"#;

fn compile(flavor: ScriptFlavor, source: &str) -> CompiledTemplate {
    ScriptTemplateBuilder::from_source(flavor, source)
        .unwrap()
        .with_image("python:3.12-alpine")
        .compile()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn parameter_schema_from_signature() {
    init_tracing();
    let compiled = compile(ScriptFlavor::Bash, TASK_SOURCE);

    assert_eq!(compiled.name(), "task");
    assert_eq!(
        compiled.parameters(),
        &[
            Parameter::new("v1"),
            Parameter::new("v2").with_default("123"),
            Parameter::new("v3").with_enum(["1", "2", "3"]).with_default("2"),
            Parameter::new("v4").with_value_from(ValueFrom::with_default("123")),
        ]
    );
}

#[test]
fn bash_template_renders_as_argo_yaml() {
    init_tracing();
    let compiled = compile(ScriptFlavor::Bash, TASK_SOURCE);

    let expected = r#"name: task
inputs:
  parameters:
  - name: v1
  - name: v2
    default: '123'
  - name: v3
    default: '2'
    enum:
    - '1'
    - '2'
    - '3'
  - name: v4
    valueFrom:
      default: '123'
script:
  image: python:3.12-alpine
  command:
  - bash
  source: |-
    v1="{{inputs.parameters.v1}}"
    v2="{{inputs.parameters.v2}}"
    v3="{{inputs.parameters.v3}}"
    v4="{{inputs.parameters.v4}}"
    echo $v1 $v2
    echo $v3 $v4
"#;
    let rendered: serde_yaml::Value = serde_yaml::from_str(&compiled.to_yaml().unwrap()).unwrap();
    let expected: serde_yaml::Value = serde_yaml::from_str(expected).unwrap();
    assert_eq!(rendered, expected);
}

#[test]
fn python_template_with_opaque_parameter() {
    init_tracing();
    let source = r#"
def report(title: str, config: dict = {"retries": 3}):
    """
    for attempt in range(config["retries"]):
        print(title, attempt)
    """
"#;
    let compiled = compile(ScriptFlavor::Python, source);
    let script = compiled.manifest().as_script().unwrap();

    assert_eq!(
        script.source,
        "title = \"{{inputs.parameters.title}}\"\n\
         import json\n\
         config = json.loads(bytes.fromhex(\"{{inputs.parameters.config}}\"))\n\
         for attempt in range(config[\"retries\"]):\n\
         \x20   print(title, attempt)"
    );
    assert_eq!(script.command, Some(vec!["python".to_string()]));

    let default = compiled.parameters()[1].default.as_deref().unwrap();
    assert_eq!(
        argo_dsl::decode_opaque(default),
        Some(serde_json::json!({"retries": 3}))
    );
}

#[test]
fn python_return_value_becomes_the_script() {
    init_tracing();
    let source = r#"
def greet(who="world"):
    return "print('hello', who)"
"#;
    let compiled = compile(ScriptFlavor::Python, source);
    let script = compiled.manifest().as_script().unwrap();
    assert_eq!(
        script.source,
        "who = \"{{inputs.parameters.who}}\"\nprint('hello', who)"
    );
    assert!(!script.source.contains("return"));
}

#[test]
fn return_value_becomes_plain_script() {
    init_tracing();
    let source = r#"
def ls(path="/"):
    return "ls -la {{inputs.parameters.path}}"
"#;
    let compiled = compile(ScriptFlavor::Plain, source);
    let script = compiled.manifest().as_script().unwrap();
    assert_eq!(script.source, "ls -la {{inputs.parameters.path}}");
    assert_eq!(script.command, Some(vec!["sh".to_string()]));
}

#[test]
fn heredoc_runner_wraps_introspected_script() {
    init_tracing();
    let source = r#"
def hello(name):
    """echo hello $name"""
"#;
    let compiled = ScriptTemplateBuilder::from_source(ScriptFlavor::Bash, source)
        .unwrap()
        .with_image("bash:5")
        .with_pre_run("echo start")
        .with_post_run("echo done")
        .compile()
        .unwrap();

    let script = compiled.manifest().as_script().unwrap();
    assert_eq!(
        script.source,
        "cat > /tmp/script << EOL\n\
         name=\"{{inputs.parameters.name}}\"\n\
         echo hello $name\n\
         EOL\n\
         \n\
         set -e\n\
         \n\
         echo start\n\
         bash /tmp/script\n\
         echo done"
    );
    assert_eq!(script.command, Some(vec!["bash".to_string()]));
}

#[test]
fn hooks_see_the_compiled_template() {
    init_tracing();
    let compiled = ScriptTemplateBuilder::from_source(ScriptFlavor::Bash, TASK_SOURCE)
        .unwrap()
        .with_image("alpine")
        .with_hook(force_image("bash:5.2"))
        .with_hook(|mut t| {
            t.name = format!("{}-v2", t.name);
            t
        })
        .compile()
        .unwrap();

    assert_eq!(compiled.name(), "task-v2");
    assert_eq!(compiled.manifest().as_script().unwrap().image, "bash:5.2");
}

#[test]
fn explicit_builder_matches_introspection() {
    init_tracing();
    let function = argo_dsl::introspect(TASK_SOURCE).unwrap();
    let explicit = TemplateBuilder::new("task")
        .with_parameters(function.parameters.clone())
        .with_producer(
            ScriptTemplateBuilder::bash()
                .with_parameters(function.parameters.clone())
                .with_body(function.docstring.clone())
                .with_image("python:3.12-alpine"),
        )
        .compile()
        .unwrap();

    assert_eq!(explicit, compile(ScriptFlavor::Bash, TASK_SOURCE));
}

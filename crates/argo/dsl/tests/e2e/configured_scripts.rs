//! End-to-end test: file configuration feeding script compilation and output.

use crate::init_tracing;
use argo_dsl::render::render;
use argo_dsl::{DslConfig, DslError, RenderFormat, ScriptFlavor, ScriptTemplateBuilder};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct ConfigFile(PathBuf);

impl ConfigFile {
    fn write(tag: &str, contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "argo-dsl-e2e-{}-{}.toml",
            tag,
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }

    fn load(&self) -> DslConfig {
        DslConfig::load(self.0.to_str()).unwrap()
    }
}

impl Drop for ConfigFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

const BUILD_SOURCE: &str = r#"
def build(target: str = "release", jobs: int = 4):
    """
    make -j$jobs $target
    """
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn configured_runner_wraps_every_script() {
    init_tracing();
    let file = ConfigFile::write(
        "runner",
        r#"
[script]
default_image = "gcc:14"
bash_command = "/bin/bash"
runner_path = "/work/build.sh"
heredoc_delimiter = "SCRIPT"
pre_run = "cd /src"
post_run = "ls out"

[render]
format = "json"
"#,
    );
    let config = file.load();

    let compiled = ScriptTemplateBuilder::from_source(ScriptFlavor::Bash, BUILD_SOURCE)
        .unwrap()
        .with_config(config.script.clone())
        .compile()
        .unwrap();

    let script = compiled.manifest().as_script().unwrap();
    assert_eq!(script.image, "gcc:14");
    assert_eq!(script.command, Some(vec!["bash".to_string()]));
    assert_eq!(
        script.source,
        "cat > /work/build.sh << SCRIPT\n\
         target=\"{{inputs.parameters.target}}\"\n\
         jobs=\"{{inputs.parameters.jobs}}\"\n\
         make -j$jobs $target\n\
         SCRIPT\n\
         \n\
         set -e\n\
         \n\
         cd /src\n\
         /bin/bash /work/build.sh\n\
         ls out"
    );

    assert_eq!(config.render.format, RenderFormat::Json);
    let rendered = render(compiled.template(), config.render.format).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed["name"], "build");
    assert_eq!(parsed["inputs"]["parameters"][1]["default"], "4");
    assert_eq!(parsed["script"]["image"], "gcc:14");
}

#[test]
fn builder_settings_override_configuration() {
    init_tracing();
    let file = ConfigFile::write(
        "override",
        r#"
[script]
default_image = "python:3.11"
python_command = "python3"
always_wrap = true
"#,
    );
    let config = file.load();

    let source = r#"
def greet(who="world"):
    """
    print(f"hello {who}")
    """
"#;
    let compiled = ScriptTemplateBuilder::from_source(ScriptFlavor::Python, source)
        .unwrap()
        .with_config(config.script)
        .with_image("python:3.13-slim")
        .with_command("uv run")
        .compile()
        .unwrap();

    let script = compiled.manifest().as_script().unwrap();
    assert_eq!(script.image, "python:3.13-slim");
    assert_eq!(
        script.source,
        "cat > /tmp/script << EOL\n\
         who = \"{{inputs.parameters.who}}\"\n\
         print(f\"hello {who}\")\n\
         EOL\n\
         \n\
         set -e\n\
         \n\
         \n\
         uv run /tmp/script"
    );

    // Default output format is YAML
    assert_eq!(config.render.format, RenderFormat::Yaml);
    let yaml = render(compiled.template(), config.render.format).unwrap();
    assert!(yaml.starts_with("name: greet\n"));
}

#[test]
fn missing_image_without_default_is_an_error() {
    init_tracing();
    let file = ConfigFile::write("noimage", "[render]\nformat = \"yaml\"\n");
    let config = file.load();

    let result = ScriptTemplateBuilder::from_source(ScriptFlavor::Bash, BUILD_SOURCE)
        .unwrap()
        .with_config(config.script)
        .compile();

    match result {
        Err(DslError::MissingField(field)) => assert_eq!(field, "image"),
        other => panic!("Expected missing image, got {:?}", other),
    }
}

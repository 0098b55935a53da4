//! Script templates
//!
//! Source assembly is one function over a closed set of flavors:
//!
//! - `Plain`: the user text as is
//! - `Bash`: one `name="{{inputs.parameters.name}}"` line per parameter
//! - `Python`: one assignment per parameter, shaped by its declared type
//!
//! A non-empty prologue is joined to the user text with a newline. With
//! `pre_run` or `post_run` set, the assembled source is written to a file
//! through a heredoc and run from a bash wrapper.

use crate::compiler::{CompiledTemplate, TemplateBuilder};
use crate::config::ScriptConfig;
use crate::errors::{DslError, DslResult};
use crate::hooks::HookChain;
use crate::introspect::{introspect, ScriptFunction};
use crate::manifest::ManifestProducer;
use crate::value::{ParameterDecl, ValueCategory};
use argo_types::{Manifest, ScriptTemplate, Template};
use tracing::debug;

/// Which runtime the script targets
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScriptFlavor {
    #[default]
    Plain,
    Bash,
    Python,
}

impl ScriptFlavor {
    /// Runtime command for this flavor
    pub fn runtime<'a>(&self, config: &'a ScriptConfig) -> &'a str {
        match self {
            Self::Plain => &config.plain_command,
            Self::Bash => &config.bash_command,
            Self::Python => &config.python_command,
        }
    }

    /// Lines that bind each parameter to its input placeholder
    pub fn prologue(&self, parameters: &[ParameterDecl]) -> String {
        match self {
            Self::Plain => String::new(),
            Self::Bash => parameters
                .iter()
                .map(|p| format!("{}=\"{}\"", p.name, input_placeholder(&p.name)))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Python => python_prologue(parameters),
        }
    }
}

/// `{{inputs.parameters.<name>}}`
pub fn input_placeholder(name: &str) -> String {
    format!("{{{{inputs.parameters.{}}}}}", name)
}

fn python_prologue(parameters: &[ParameterDecl]) -> String {
    let mut lines = Vec::with_capacity(parameters.len() + 1);
    let mut imported_json = false;

    for param in parameters {
        let placeholder = input_placeholder(&param.name);
        match param.declared_type.category() {
            ValueCategory::Text | ValueCategory::Reference => {
                lines.push(format!("{} = \"{}\"", param.name, placeholder));
            }
            ValueCategory::Scalar => {
                lines.push(format!("{} = {}", param.name, placeholder));
            }
            ValueCategory::Opaque => {
                if !imported_json {
                    lines.push("import json".to_string());
                    imported_json = true;
                }
                lines.push(format!(
                    "{} = json.loads(bytes.fromhex(\"{}\"))",
                    param.name, placeholder
                ));
            }
        }
    }

    lines.join("\n")
}

/// Prologue and user text joined with a newline, or the text alone
pub fn assemble_source(flavor: ScriptFlavor, parameters: &[ParameterDecl], text: &str) -> String {
    let prologue = flavor.prologue(parameters);
    if prologue.is_empty() {
        text.to_string()
    } else {
        format!("{}\n{}", prologue, text)
    }
}

/// Wrap a script in the bash heredoc runner
pub fn heredoc_runner(
    source: &str,
    runtime: &str,
    pre_run: &str,
    post_run: &str,
    config: &ScriptConfig,
) -> String {
    let path = &config.runner_path;
    let delimiter = &config.heredoc_delimiter;
    format!(
        "cat > {path} << {delimiter}\n{source}\n{delimiter}\n\nset -e\n\n{pre_run}\n{runtime} {path}\n{post_run}"
    )
    .trim()
    .to_string()
}

/// Builds a script template from a body and a parameter list
///
/// ```
/// use argo_dsl::{ParameterDecl, ScriptTemplateBuilder};
///
/// let compiled = ScriptTemplateBuilder::bash()
///     .with_name("greet")
///     .with_image("alpine:3.19")
///     .with_parameter(ParameterDecl::string("who").with_default("world"))
///     .with_body("echo \"hello $who\"")
///     .compile()
///     .unwrap();
///
/// let script = compiled.manifest().as_script().unwrap();
/// assert_eq!(script.source, "who=\"{{inputs.parameters.who}}\"\necho \"hello $who\"");
/// ```
#[derive(Debug, Default)]
pub struct ScriptTemplateBuilder {
    flavor: ScriptFlavor,
    name: Option<String>,
    image: Option<String>,
    body: String,
    parameters: Vec<ParameterDecl>,
    command: Option<String>,
    pre_run: Option<String>,
    post_run: Option<String>,
    config: ScriptConfig,
    hooks: HookChain,
}

impl ScriptTemplateBuilder {
    pub fn new(flavor: ScriptFlavor) -> Self {
        Self {
            flavor,
            ..Default::default()
        }
    }

    pub fn plain() -> Self {
        Self::new(ScriptFlavor::Plain)
    }

    pub fn bash() -> Self {
        Self::new(ScriptFlavor::Bash)
    }

    pub fn python() -> Self {
        Self::new(ScriptFlavor::Python)
    }

    /// Name, parameters and text taken from an introspected function
    ///
    /// The script is what the function returns: its docstring, else its
    /// literal return value, for every flavor.
    pub fn from_function(flavor: ScriptFlavor, function: &ScriptFunction) -> Self {
        Self::new(flavor)
            .with_name(&function.name)
            .with_parameters(function.parameters.clone())
            .with_body(function.script_text())
    }

    /// Introspect Python source and build from the function it defines
    pub fn from_source(flavor: ScriptFlavor, source: &str) -> DslResult<Self> {
        Ok(Self::from_function(flavor, &introspect(source)?))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterDecl) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Replace the parameter list
    pub fn with_parameters(mut self, parameters: Vec<ParameterDecl>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Override the runtime command of the flavor
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_pre_run(mut self, pre_run: impl Into<String>) -> Self {
        self.pre_run = Some(pre_run.into());
        self
    }

    pub fn with_post_run(mut self, post_run: impl Into<String>) -> Self {
        self.post_run = Some(post_run.into());
        self
    }

    pub fn with_config(mut self, config: ScriptConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Template) -> Template + Send + Sync + 'static,
    {
        self.hooks.push(hook);
        self
    }

    pub fn flavor(&self) -> ScriptFlavor {
        self.flavor
    }

    pub fn parameters(&self) -> &[ParameterDecl] {
        &self.parameters
    }

    /// Script source before any runner wrapping
    pub fn assemble_source(&self) -> String {
        assemble_source(self.flavor, &self.parameters, &self.body)
    }

    fn runtime(&self) -> &str {
        self.command
            .as_deref()
            .unwrap_or_else(|| self.flavor.runtime(&self.config))
    }

    fn pre_run(&self) -> &str {
        self.pre_run.as_deref().unwrap_or(&self.config.pre_run)
    }

    fn post_run(&self) -> &str {
        self.post_run.as_deref().unwrap_or(&self.config.post_run)
    }

    fn wraps(&self) -> bool {
        self.config.always_wrap || !self.pre_run().is_empty() || !self.post_run().is_empty()
    }

    /// Hand over to the generic template builder
    pub fn build(mut self) -> DslResult<TemplateBuilder> {
        let name = self
            .name
            .take()
            .ok_or_else(|| DslError::MissingField("name".to_string()))?;
        let hooks = std::mem::take(&mut self.hooks);
        let parameters = self.parameters.clone();

        Ok(TemplateBuilder::new(name)
            .with_parameters(parameters)
            .with_hooks(hooks)
            .with_producer(self))
    }

    pub fn compile(self) -> DslResult<CompiledTemplate> {
        self.build()?.compile()
    }
}

impl ManifestProducer for ScriptTemplateBuilder {
    fn specify_manifest(&self) -> DslResult<Manifest> {
        let image = self
            .image
            .as_deref()
            .unwrap_or(&self.config.default_image);
        if image.is_empty() {
            return Err(DslError::MissingField("image".to_string()));
        }

        let source = self.assemble_source();
        let runtime = self.runtime();
        let wrapped = self.wraps();
        debug!(flavor = ?self.flavor, runtime, wrapped, "Assembled script source");

        let script = if wrapped {
            let runner = heredoc_runner(&source, runtime, self.pre_run(), self.post_run(), &self.config);
            ScriptTemplate::new(image, runner).with_command(["bash"])
        } else {
            ScriptTemplate::new(image, source).with_command([runtime])
        };
        Ok(script.into())
    }
}

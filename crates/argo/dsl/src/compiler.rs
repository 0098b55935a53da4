//! Compiler: turns a template definition into an Argo `Template`
//!
//! Compilation runs in a fixed order: parameter schema, name, manifest,
//! hooks, then a structural check of the result.

use crate::encoder;
use crate::errors::{DslError, DslResult};
use crate::hooks::HookChain;
use crate::manifest::{ManifestKind, ManifestProducer, ManifestSpec};
use crate::parameters::build_parameters;
use crate::render;
use crate::steps::TaskStep;
use crate::value::{CallArguments, ParameterDecl, TypeTag};
use argo_types::{Manifest, Parameter, Template};
use tracing::debug;

/// Definition of a template before compilation
///
/// A manifest set with [`with_manifest`](Self::with_manifest) takes
/// precedence over a producer; the producer is then never called.
#[derive(Default)]
pub struct TemplateBuilder {
    name: String,
    parameters: Vec<ParameterDecl>,
    manifest: Option<ManifestSpec>,
    producer: Option<Box<dyn ManifestProducer>>,
    hooks: HookChain,
}

impl TemplateBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
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

    pub fn with_manifest(mut self, manifest: impl Into<ManifestSpec>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    pub fn with_producer(mut self, producer: impl ManifestProducer + 'static) -> Self {
        self.producer = Some(Box::new(producer));
        self
    }

    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Template) -> Template + Send + Sync + 'static,
    {
        self.hooks.push(hook);
        self
    }

    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks.extend(hooks);
        self
    }

    pub fn compile(&self) -> DslResult<CompiledTemplate> {
        let parameters = build_parameters(&self.parameters)?;

        if self.name.trim().is_empty() {
            return Err(DslError::MissingField("name".to_string()));
        }

        let manifest = self.resolve_manifest()?;
        debug!(
            template = %self.name,
            kind = %ManifestKind::of(&manifest),
            parameters = parameters.len(),
            "Compiling template"
        );

        let template = Template::new(&self.name, manifest).with_parameters(parameters);
        let template = self.hooks.apply(template);
        template.validate()?;

        Ok(CompiledTemplate {
            template,
            declarations: self.parameters.clone(),
        })
    }

    fn resolve_manifest(&self) -> DslResult<Manifest> {
        match (&self.manifest, &self.producer) {
            (Some(spec), _) => spec.resolve(),
            (None, Some(producer)) => producer.specify_manifest(),
            (None, None) => Err(DslError::MissingManifestProducer(self.name.clone())),
        }
    }
}

impl std::fmt::Debug for TemplateBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateBuilder")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("manifest", &self.manifest)
            .field("producer", &self.producer.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// A compiled template, read-only
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledTemplate {
    template: Template,
    declarations: Vec<ParameterDecl>,
}

impl CompiledTemplate {
    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        self.template.parameters()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.template.manifest
    }

    pub fn declarations(&self) -> &[ParameterDecl] {
        &self.declarations
    }

    pub fn declared_type(&self, parameter: &str) -> Option<&TypeTag> {
        self.declarations
            .iter()
            .find(|decl| decl.name == parameter)
            .map(|decl| &decl.declared_type)
    }

    pub fn into_template(self) -> Template {
        self.template
    }

    /// Encode call arguments by this template's declared types
    pub fn resolve_arguments(&self, args: &CallArguments) -> DslResult<Vec<Parameter>> {
        encoder::resolve_arguments(args, |name| self.declared_type(name))
    }

    /// A step that invokes this template
    pub fn step(&self, name: impl Into<String>) -> TaskStep {
        TaskStep::new(name, self.name())
    }

    pub fn to_yaml(&self) -> DslResult<String> {
        render::to_yaml(&self.template)
    }

    pub fn to_json(&self) -> DslResult<String> {
        render::to_json(&self.template)
    }
}

impl std::fmt::Display for CompiledTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_yaml() {
            Ok(yaml) => f.write_str(&yaml),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

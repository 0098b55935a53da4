//! Step invocation model
//!
//! A [`TaskStep`] is a named call of one compiled template. Steps are
//! collected into [`TaskSteps`], an ordered list of stages; steps added inside
//! a parallel scope share one stage and run concurrently on the engine.
//!
//! Step accessors return engine placeholder tokens such as
//! `{{steps.<name>.outputs.result}}`, so the output of one step can be passed
//! as the argument of a later one.

use crate::compiler::CompiledTemplate;
use crate::encoder::{self, EncodedArgument};
use crate::errors::{DslError, DslResult};
use crate::value::CallArguments;
use argo_types::{Arguments, ParallelSteps, Parameter, Sequence, WorkflowStep};
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// The current element of a `withItems` / `withParam` loop
pub const ITEM: &str = "{{item}}";

pub fn item() -> String {
    ITEM.to_string()
}

/// `{{item.<field>}}`
pub fn item_field(field: &str) -> String {
    format!("{{{{item.{}}}}}", field)
}

fn step_token(step: &str, path: &str) -> String {
    format!("{{{{steps.{}.{}}}}}", step, path)
}

/// Token for a step's output parameters or artifacts
///
/// Displays as the bare token; [`field`](Self::field) gives the token of one
/// named output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepOutputs {
    step: String,
    kind: &'static str,
}

impl StepOutputs {
    fn new(step: &str, kind: &'static str) -> Self {
        Self {
            step: step.to_string(),
            kind,
        }
    }

    pub fn token(&self) -> String {
        step_token(&self.step, &format!("outputs.{}", self.kind))
    }

    pub fn field(&self, name: &str) -> String {
        step_token(&self.step, &format!("outputs.{}.{}", self.kind, name))
    }
}

impl std::fmt::Display for StepOutputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token())
    }
}

impl PartialEq<str> for StepOutputs {
    fn eq(&self, other: &str) -> bool {
        self.token() == other
    }
}

impl PartialEq<&str> for StepOutputs {
    fn eq(&self, other: &&str) -> bool {
        self.token() == *other
    }
}

impl PartialEq<String> for StepOutputs {
    fn eq(&self, other: &String) -> bool {
        self.token() == *other
    }
}

impl From<StepOutputs> for String {
    fn from(outputs: StepOutputs) -> Self {
        outputs.token()
    }
}

/// Loop arguments of a step
#[derive(Clone, Debug, PartialEq)]
pub enum BatchArguments {
    /// Expression producing a JSON list (`withParam`)
    Param(String),
    /// Literal list of argument maps (`withItems`)
    Items(Vec<CallArguments>),
}

impl From<&str> for BatchArguments {
    fn from(expression: &str) -> Self {
        Self::Param(expression.to_string())
    }
}

impl From<String> for BatchArguments {
    fn from(expression: String) -> Self {
        Self::Param(expression)
    }
}

impl From<Vec<CallArguments>> for BatchArguments {
    fn from(items: Vec<CallArguments>) -> Self {
        Self::Items(items)
    }
}

/// One invocation of a compiled template
#[derive(Clone, Debug, PartialEq)]
pub struct TaskStep {
    name: String,
    template: String,
    arguments: Option<CallArguments>,
    batch_arguments: Option<BatchArguments>,
    sequence: Option<Sequence>,
    when: Option<String>,
}

impl TaskStep {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            arguments: None,
            batch_arguments: None,
            sequence: None,
            when: None,
        }
    }

    pub fn call(mut self, arguments: CallArguments) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn batch_call(mut self, batch: impl Into<BatchArguments>) -> Self {
        self.batch_arguments = Some(batch.into());
        self
    }

    pub fn sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn when(mut self, expression: impl Into<String>) -> Self {
        self.when = Some(expression.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template_name(&self) -> &str {
        &self.template
    }

    pub fn arguments(&self) -> Option<&CallArguments> {
        self.arguments.as_ref()
    }

    pub fn batch_arguments(&self) -> Option<&BatchArguments> {
        self.batch_arguments.as_ref()
    }

    pub fn condition(&self) -> Option<&str> {
        self.when.as_deref()
    }

    pub fn id(&self) -> String {
        step_token(&self.name, "id")
    }

    pub fn ip(&self) -> String {
        step_token(&self.name, "ip")
    }

    pub fn status(&self) -> String {
        step_token(&self.name, "status")
    }

    pub fn exit_code(&self) -> String {
        step_token(&self.name, "exitCode")
    }

    pub fn started_at(&self) -> String {
        step_token(&self.name, "startedAt")
    }

    pub fn finished_at(&self) -> String {
        step_token(&self.name, "finishedAt")
    }

    pub fn outputs_result(&self) -> String {
        step_token(&self.name, "outputs.result")
    }

    pub fn outputs_parameters(&self) -> StepOutputs {
        StepOutputs::new(&self.name, "parameters")
    }

    pub fn outputs_artifacts(&self) -> StepOutputs {
        StepOutputs::new(&self.name, "artifacts")
    }

    /// Serialize against the template this step was created from
    pub fn to_workflow_step(&self, template: &CompiledTemplate) -> DslResult<WorkflowStep> {
        if template.name() != self.template {
            return Err(DslError::TemplateMismatch {
                step: self.name.clone(),
                expected: self.template.clone(),
                found: template.name().to_string(),
            });
        }

        let parameters = match (&self.arguments, &self.batch_arguments) {
            (Some(args), _) => template.resolve_arguments(args)?,
            (None, Some(BatchArguments::Items(items))) => item_arguments(items),
            (None, _) => Vec::new(),
        };

        let (with_items, with_param) = match &self.batch_arguments {
            Some(BatchArguments::Items(items)) => (Some(encode_items(template, items)?), None),
            Some(BatchArguments::Param(expression)) => (None, Some(expression.clone())),
            None => (None, None),
        };

        debug!(
            step = %self.name,
            template = %self.template,
            arguments = parameters.len(),
            "Serialized step"
        );

        Ok(WorkflowStep {
            name: self.name.clone(),
            template: self.template.clone(),
            arguments: (!parameters.is_empty()).then(|| Arguments::new(parameters)),
            with_items,
            with_param,
            with_sequence: self.sequence.clone(),
            when: self.when.clone(),
        })
    }
}

/// `name={{item.name}}` for every key used by the items, first use first
fn item_arguments(items: &[CallArguments]) -> Vec<Parameter> {
    let mut names: Vec<&str> = Vec::new();
    for name in items.iter().flat_map(CallArguments::names) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
        .into_iter()
        .map(|name| Parameter::new(name).with_value(item_field(name)))
        .collect()
}

fn encode_items(
    template: &CompiledTemplate,
    items: &[CallArguments],
) -> DslResult<Vec<serde_json::Value>> {
    items
        .iter()
        .map(|item| {
            let mut object = serde_json::Map::new();
            for (name, value) in item.iter() {
                match encoder::encode_argument(name, value, template.declared_type(name))? {
                    EncodedArgument::Literal(text) => {
                        object.insert(name.to_string(), serde_json::Value::String(text));
                    }
                    EncodedArgument::Reference(_) => {
                        return Err(DslError::encoding(
                            name,
                            "a reference cannot be a loop item",
                        ))
                    }
                }
            }
            Ok(serde_json::Value::Object(object))
        })
        .collect()
}

/// Ordered stages of steps
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskSteps {
    stages: Vec<Vec<TaskStep>>,
    parallel: bool,
    stage_open: bool,
}

impl TaskSteps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step: a stage of its own, or the open parallel stage
    pub fn add(&mut self, step: TaskStep) -> &mut Self {
        if self.parallel {
            if !self.stage_open {
                self.stages.push(Vec::new());
                self.stage_open = true;
            }
            if let Some(stage) = self.stages.last_mut() {
                stage.push(step);
            }
        } else {
            self.stages.push(vec![step]);
        }
        self
    }

    /// Steps added through the guard share one new stage until it drops
    pub fn parallel_scope(&mut self) -> ParallelScope<'_> {
        let saved = (self.parallel, self.stage_open);
        self.parallel = true;
        self.stage_open = false;
        ParallelScope { steps: self, saved }
    }

    /// Run `f` inside a parallel scope
    ///
    /// The scope closes when `f` returns, including early returns through
    /// `?` inside `f`.
    pub fn parallel<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut TaskSteps) -> R,
    {
        let mut scope = self.parallel_scope();
        f(&mut scope)
    }

    pub fn stages(&self) -> &[Vec<TaskStep>] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Serialize every stage, looking up each step's template by name
    pub fn to_parallel_steps<'a, F>(&self, resolve: F) -> DslResult<Vec<ParallelSteps>>
    where
        F: Fn(&str) -> Option<&'a CompiledTemplate>,
    {
        self.stages
            .iter()
            .map(|stage| {
                stage
                    .iter()
                    .map(|step| {
                        let template = resolve(step.template_name()).ok_or_else(|| {
                            DslError::UnknownTemplate(step.template_name().to_string())
                        })?;
                        step.to_workflow_step(template)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Open parallel stage; closes on drop
pub struct ParallelScope<'a> {
    steps: &'a mut TaskSteps,
    saved: (bool, bool),
}

impl Deref for ParallelScope<'_> {
    type Target = TaskSteps;

    fn deref(&self) -> &TaskSteps {
        self.steps
    }
}

impl DerefMut for ParallelScope<'_> {
    fn deref_mut(&mut self) -> &mut TaskSteps {
        self.steps
    }
}

impl Drop for ParallelScope<'_> {
    fn drop(&mut self) {
        let (parallel, stage_open) = self.saved;
        self.steps.parallel = parallel;
        // An enclosing scope continues in a fresh stage
        self.steps.stage_open = stage_open && !parallel;
    }
}

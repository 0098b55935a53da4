//! Manifest selection and the stock manifest producers

use crate::errors::{DslError, DslResult};
use argo_types::{
    Container, EnvVar, Manifest, MergeStrategy, ResourceAction, ResourceTemplate, ScriptTemplate,
};
use tracing::trace;

/// The three manifest kinds a template can carry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    Container,
    Script,
    Resource,
}

impl ManifestKind {
    pub fn of(manifest: &Manifest) -> Self {
        match manifest {
            Manifest::Container(_) => Self::Container,
            Manifest::Script(_) => Self::Script,
            Manifest::Resource(_) => Self::Resource,
        }
    }

    /// Classify a raw manifest by the fields it carries
    ///
    /// A document keyed by `container`, `script` or `resource` is taken at
    /// its word. Otherwise `source` marks a script, `action` or `manifest`
    /// a resource, and `image`, `command` or `args` a container.
    pub fn classify(value: &serde_json::Value) -> DslResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            DslError::UnknownManifestKind(format!("expected an object, found {}", value))
        })?;

        if object.len() == 1 {
            match object.keys().next().map(String::as_str) {
                Some("container") => return Ok(Self::Container),
                Some("script") => return Ok(Self::Script),
                Some("resource") => return Ok(Self::Resource),
                _ => {}
            }
        }

        let has = |key: &str| object.contains_key(key);
        if has("source") {
            Ok(Self::Script)
        } else if has("action") || has("manifest") {
            Ok(Self::Resource)
        } else if has("image") || has("command") || has("args") {
            Ok(Self::Container)
        } else {
            let keys: Vec<&str> = object.keys().map(String::as_str).collect();
            Err(DslError::UnknownManifestKind(format!(
                "no manifest kind has fields [{}]",
                keys.join(", ")
            )))
        }
    }
}

impl std::fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Container => write!(f, "container"),
            Self::Script => write!(f, "script"),
            Self::Resource => write!(f, "resource"),
        }
    }
}

/// An explicitly supplied manifest
#[derive(Clone, Debug, PartialEq)]
pub enum ManifestSpec {
    Typed(Manifest),
    /// A manifest document that still has to be classified
    Raw(serde_json::Value),
}

impl ManifestSpec {
    pub fn resolve(&self) -> DslResult<Manifest> {
        let raw = match self {
            Self::Typed(manifest) => return Ok(manifest.clone()),
            Self::Raw(raw) => raw,
        };

        let kind = ManifestKind::classify(raw)?;
        let body = match raw.get(kind.to_string()) {
            Some(inner) if raw.as_object().is_some_and(|o| o.len() == 1) => inner.clone(),
            _ => raw.clone(),
        };
        trace!(%kind, "Classified raw manifest");

        let invalid = |e: serde_json::Error| DslError::InvalidManifest {
            kind: kind.to_string(),
            message: e.to_string(),
        };
        Ok(match kind {
            ManifestKind::Container => {
                Manifest::Container(serde_json::from_value(body).map_err(invalid)?)
            }
            ManifestKind::Script => Manifest::Script(serde_json::from_value(body).map_err(invalid)?),
            ManifestKind::Resource => {
                if body.get("action").is_none() {
                    return Err(DslError::MissingField("action".to_string()));
                }
                Manifest::Resource(serde_json::from_value(body).map_err(invalid)?)
            }
        })
    }
}

impl From<Manifest> for ManifestSpec {
    fn from(manifest: Manifest) -> Self {
        Self::Typed(manifest)
    }
}

impl From<Container> for ManifestSpec {
    fn from(container: Container) -> Self {
        Self::Typed(container.into())
    }
}

impl From<ScriptTemplate> for ManifestSpec {
    fn from(script: ScriptTemplate) -> Self {
        Self::Typed(script.into())
    }
}

impl From<ResourceTemplate> for ManifestSpec {
    fn from(resource: ResourceTemplate) -> Self {
        Self::Typed(resource.into())
    }
}

impl From<serde_json::Value> for ManifestSpec {
    fn from(raw: serde_json::Value) -> Self {
        Self::Raw(raw)
    }
}

/// Supplies a manifest when a template has none set explicitly
pub trait ManifestProducer: Send + Sync {
    fn specify_manifest(&self) -> DslResult<Manifest>;
}

impl<F> ManifestProducer for F
where
    F: Fn() -> DslResult<Manifest> + Send + Sync,
{
    fn specify_manifest(&self) -> DslResult<Manifest> {
        self()
    }
}

/// Container manifest from an image and optional command line
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContainerTemplateBuilder {
    image: String,
    command: Option<Vec<String>>,
    args: Option<Vec<String>>,
    env: Vec<EnvVar>,
}

impl ContainerTemplateBuilder {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(command.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar {
            name: name.into(),
            value: Some(value.into()),
        });
        self
    }
}

impl ManifestProducer for ContainerTemplateBuilder {
    fn specify_manifest(&self) -> DslResult<Manifest> {
        if self.image.is_empty() {
            return Err(DslError::MissingField("image".to_string()));
        }
        let mut container = Container::new(&self.image);
        container.command = self.command.clone();
        container.args = self.args.clone();
        container.env = self.env.clone();
        Ok(container.into())
    }
}

/// Resource manifest: an action on an opaque Kubernetes document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceTemplateBuilder {
    action: Option<ResourceAction>,
    manifest: Option<String>,
    flags: Option<Vec<String>>,
    merge_strategy: Option<MergeStrategy>,
    failure_condition: Option<String>,
    success_condition: Option<String>,
    set_owner_reference: Option<bool>,
}

impl ResourceTemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: ResourceAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Manifest text, copied into the template unchanged
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = Some(flags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = Some(strategy);
        self
    }

    pub fn with_failure_condition(mut self, condition: impl Into<String>) -> Self {
        self.failure_condition = Some(condition.into());
        self
    }

    pub fn with_success_condition(mut self, condition: impl Into<String>) -> Self {
        self.success_condition = Some(condition.into());
        self
    }

    pub fn with_owner_reference(mut self, set: bool) -> Self {
        self.set_owner_reference = Some(set);
        self
    }
}

impl ManifestProducer for ResourceTemplateBuilder {
    fn specify_manifest(&self) -> DslResult<Manifest> {
        let action = self
            .action
            .ok_or_else(|| DslError::MissingField("action".to_string()))?;

        Ok(ResourceTemplate {
            action,
            manifest: self.manifest.clone(),
            flags: self.flags.clone(),
            merge_strategy: self.merge_strategy,
            failure_condition: self.failure_condition.clone(),
            success_condition: self.success_condition.clone(),
            set_owner_reference: self.set_owner_reference,
        }
        .into())
    }
}

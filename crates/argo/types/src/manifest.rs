//! Manifest kinds: container, script and resource bodies

use serde::{Deserialize, Serialize};

/// The execution body of a template
///
/// Externally tagged, so when flattened into a [`crate::Template`] it
/// serializes as exactly one of the `container`, `script` or `resource`
/// keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Manifest {
    Container(Container),
    Script(ScriptTemplate),
    Resource(ResourceTemplate),
}

impl Manifest {
    /// The schema key this manifest serializes under
    pub fn key(&self) -> &'static str {
        match self {
            Self::Container(_) => "container",
            Self::Script(_) => "script",
            Self::Resource(_) => "resource",
        }
    }

    pub fn as_script(&self) -> Option<&ScriptTemplate> {
        match self {
            Self::Script(script) => Some(script),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Container(container) => Some(container),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceTemplate> {
        match self {
            Self::Resource(resource) => Some(resource),
            _ => None,
        }
    }
}

impl From<Container> for Manifest {
    fn from(container: Container) -> Self {
        Self::Container(container)
    }
}

impl From<ScriptTemplate> for Manifest {
    fn from(script: ScriptTemplate) -> Self {
        Self::Script(script)
    }
}

impl From<ResourceTemplate> for Manifest {
    fn from(resource: ResourceTemplate) -> Self {
        Self::Resource(resource)
    }
}

/// An environment variable for a container
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A Kubernetes container spec (the fields templates use)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

impl Container {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
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

/// A script template: a container whose program is inlined as `source`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptTemplate {
    pub image: String,
    /// The runtime that executes `source` (e.g. `["python"]`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

impl ScriptTemplate {
    pub fn new(image: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            source: source.into(),
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
}

/// kubectl verb applied to a resource manifest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAction {
    Get,
    Create,
    Apply,
    Delete,
    Replace,
    Patch,
}

impl std::fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Apply => write!(f, "apply"),
            Self::Delete => write!(f, "delete"),
            Self::Replace => write!(f, "replace"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

/// Patch strategy for `patch` actions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    Strategic,
    Merge,
    Json,
}

/// A resource template: an opaque Kubernetes manifest plus execution policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    pub action: ResourceAction,
    /// Manifest text, passed to the engine uninterpreted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<MergeStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_owner_reference: Option<bool>,
}

impl ResourceTemplate {
    pub fn new(action: ResourceAction) -> Self {
        Self {
            action,
            manifest: None,
            flags: None,
            merge_strategy: None,
            failure_condition: None,
            success_condition: None,
            set_owner_reference: None,
        }
    }

    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }
}

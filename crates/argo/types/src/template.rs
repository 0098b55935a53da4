//! Templates: named units of work with inputs and one manifest

use crate::{Manifest, Parameter, TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Template inputs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inputs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

impl Inputs {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// An Argo workflow template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default, skip_serializing_if = "Inputs::is_empty")]
    pub inputs: Inputs,
    /// Serialized as exactly one of `container`, `script` or `resource`
    #[serde(flatten)]
    pub manifest: Manifest,
}

impl Template {
    pub fn new(name: impl Into<String>, manifest: impl Into<Manifest>) -> Self {
        Self {
            name: name.into(),
            inputs: Inputs::default(),
            manifest: manifest.into(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.inputs = Inputs::new(parameters);
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.inputs.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.inputs.parameters.iter().find(|p| p.name == name)
    }

    /// Check the structural rules the engine enforces on templates
    pub fn validate(&self) -> TypesResult<()> {
        if self.name.trim().is_empty() {
            return Err(TypesError::EmptyName);
        }

        let mut seen = HashSet::new();
        for param in &self.inputs.parameters {
            if param.name.is_empty() {
                return Err(TypesError::EmptyParameterName);
            }
            if !seen.insert(param.name.as_str()) {
                return Err(TypesError::DuplicateParameter(param.name.clone()));
            }
            if param.default.is_some() && param.value_from.is_some() {
                return Err(TypesError::ConflictingParameterSource(param.name.clone()));
            }
        }

        Ok(())
    }
}

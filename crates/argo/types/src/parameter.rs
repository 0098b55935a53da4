//! Template parameters and indirect value sources

use serde::{Deserialize, Serialize};

/// A template input parameter
///
/// At most one of `default` / `value_from` is set; `enum_values` may
/// accompany either.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name (used in `{{inputs.parameters.<name>}}`)
    pub name: String,
    /// Literal default, always rendered as text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Closed set of allowed values
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Literal value (used by step arguments)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Indirect value source resolved by the engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_from: Option<ValueFrom>,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_value_from(mut self, value_from: ValueFrom) -> Self {
        self.value_from = Some(value_from);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A parameter with neither a default nor a reference must be supplied
    /// by the caller.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && self.value_from.is_none()
    }
}

/// Where the engine should look up a parameter value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFrom {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map_key_ref: Option<ConfigMapKeySelector>,
    /// Fallback when the lookup yields nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jq_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ValueFrom {
    pub fn with_default(default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            ..Default::default()
        }
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn from_parameter(parameter: impl Into<String>) -> Self {
        Self {
            parameter: Some(parameter.into()),
            ..Default::default()
        }
    }

    pub fn from_expression(expression: impl Into<String>) -> Self {
        Self {
            expression: Some(expression.into()),
            ..Default::default()
        }
    }

    pub fn from_config_map(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            config_map_key_ref: Some(ConfigMapKeySelector::new(name, key)),
            ..Default::default()
        }
    }
}

/// Selects a key of a ConfigMap
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapKeySelector {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

impl ConfigMapKeySelector {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: Some(name.into()),
            optional: None,
        }
    }
}

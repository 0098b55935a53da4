//! YAML and JSON output for templates and step stages

use crate::config::RenderFormat;
use crate::errors::DslResult;
use serde::Serialize;

pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> DslResult<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// Pretty-printed JSON
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> DslResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render<T: Serialize + ?Sized>(value: &T, format: RenderFormat) -> DslResult<String> {
    match format {
        RenderFormat::Yaml => to_yaml(value),
        RenderFormat::Json => to_json(value),
    }
}

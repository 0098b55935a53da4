//! Parameter schema: declarations to template input parameters

use crate::encoder::{self, EncodedArgument};
use crate::errors::{DslError, DslResult};
use crate::value::{ParameterDecl, TypeTag};
use argo_types::Parameter;
use std::collections::HashSet;
use tracing::debug;

/// Build the template's input parameters, preserving declaration order
///
/// - a reference default becomes `valueFrom` and never a `default`
/// - any other default is encoded into `default`
/// - `Choice` types add `enum`, whether or not a default is present
/// - no default and no reference leaves a required parameter
pub fn build_parameters(decls: &[ParameterDecl]) -> DslResult<Vec<Parameter>> {
    let mut seen = HashSet::new();
    let mut parameters = Vec::with_capacity(decls.len());

    for decl in decls {
        if !seen.insert(decl.name.as_str()) {
            return Err(DslError::DuplicateParameter(decl.name.clone()));
        }
        parameters.push(build_parameter(decl)?);
    }

    debug!(count = parameters.len(), "Built parameter schema");
    Ok(parameters)
}

fn build_parameter(decl: &ParameterDecl) -> DslResult<Parameter> {
    let mut param = Parameter::new(&decl.name);

    match encoder::encode_default(decl)? {
        Some(EncodedArgument::Reference(value_from)) => param.value_from = Some(value_from),
        Some(EncodedArgument::Literal(text)) => param.default = Some(text),
        None => {}
    }

    if let TypeTag::Choice(values) = &decl.declared_type {
        param.enum_values = Some(values.clone());
    }

    Ok(param)
}

//! Argument encoding shared by parameter defaults and step arguments
//!
//! One category table decides how a value becomes text:
//!
//! | Category  | Encoding                                             |
//! |-----------|------------------------------------------------------|
//! | Text      | verbatim                                             |
//! | Scalar    | Python literal text (`1`, `1.5`, `True`, `(1+2j)`)   |
//! | Reference | `valueFrom` lookup, never a literal                  |
//! | Opaque    | hex of the value's JSON bytes                        |
//!
//! The declared type picks the row when one is known, otherwise the value's
//! own category does. Defaults ([`encode_default`]) and call arguments
//! ([`encode_argument`]) go through the same [`encode`] function, so the same
//! value for the same declared type always yields the same string.

use crate::errors::{DslError, DslResult};
use crate::value::{ArgValue, CallArguments, Complex, ParameterDecl, TypeTag, ValueCategory};
use argo_types::{Parameter, ValueFrom};
use tracing::trace;

/// An encoded value: either literal text or an indirect reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodedArgument {
    Literal(String),
    Reference(ValueFrom),
}

impl EncodedArgument {
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            Self::Reference(_) => None,
        }
    }

    /// Render as a step argument (`value` or `valueFrom`)
    pub fn into_argument(self, name: impl Into<String>) -> Parameter {
        let param = Parameter::new(name);
        match self {
            Self::Literal(text) => param.with_value(text),
            Self::Reference(value_from) => param.with_value_from(value_from),
        }
    }
}

/// Category row used for `value`, given the declared type if any
pub fn category_for(value: &ArgValue, declared: Option<&TypeTag>) -> ValueCategory {
    if value.is_reference() {
        return ValueCategory::Reference;
    }
    match declared.map(TypeTag::category) {
        None | Some(ValueCategory::Reference) => value.category(),
        Some(category) => category,
    }
}

/// Encode one value; `name` is only used for error context
pub fn encode(
    name: &str,
    value: &ArgValue,
    declared: Option<&TypeTag>,
) -> DslResult<EncodedArgument> {
    if let ArgValue::Reference(value_from) = value {
        return Ok(EncodedArgument::Reference(value_from.clone()));
    }

    let category = category_for(value, declared);
    let literal = match category {
        ValueCategory::Opaque => opaque_literal(name, value)?,
        ValueCategory::Scalar => scalar_literal(name, value)?,
        ValueCategory::Text | ValueCategory::Reference => text_literal(name, value)?,
    };

    trace!(parameter = name, ?category, "Encoded argument");
    Ok(EncodedArgument::Literal(literal))
}

/// Declaration-time encoding of a parameter default
pub fn encode_default(decl: &ParameterDecl) -> DslResult<Option<EncodedArgument>> {
    decl.default
        .as_ref()
        .map(|value| encode(&decl.name, value, Some(&decl.declared_type)))
        .transpose()
}

/// Call-time encoding of a step argument
pub fn encode_argument(
    name: &str,
    value: &ArgValue,
    declared: Option<&TypeTag>,
) -> DslResult<EncodedArgument> {
    encode(name, value, declared)
}

/// Encode call arguments, looking up each declared type through `declared`
pub fn resolve_arguments<'a, F>(args: &CallArguments, declared: F) -> DslResult<Vec<Parameter>>
where
    F: Fn(&str) -> Option<&'a TypeTag>,
{
    args.iter()
        .map(|(name, value)| {
            encode_argument(name, value, declared(name)).map(|encoded| encoded.into_argument(name))
        })
        .collect()
}

/// Encode call arguments by value category alone
pub fn default_resolve_arguments(args: &CallArguments) -> DslResult<Vec<Parameter>> {
    resolve_arguments(args, |_| None)
}

fn text_literal(name: &str, value: &ArgValue) -> DslResult<String> {
    match value {
        ArgValue::String(text) => Ok(text.clone()),
        ArgValue::Opaque(serde_json::Value::String(text)) => Ok(text.clone()),
        _ => scalar_literal(name, value),
    }
}

fn scalar_literal(name: &str, value: &ArgValue) -> DslResult<String> {
    match value {
        ArgValue::String(text) => Ok(text.clone()),
        ArgValue::Integer(i) => Ok(i.to_string()),
        ArgValue::Float(f) => python_float(*f)
            .ok_or_else(|| DslError::encoding(name, format!("{} has no literal form", f))),
        ArgValue::Boolean(b) => Ok(python_bool(*b).to_string()),
        ArgValue::Complex(c) => python_complex(*c)
            .ok_or_else(|| DslError::encoding(name, "complex value is not finite")),
        ArgValue::Opaque(json) => json_scalar_literal(name, json),
        ArgValue::Reference(_) => Err(DslError::encoding(
            name,
            "a reference cannot be rendered as a literal",
        )),
    }
}

fn json_scalar_literal(name: &str, json: &serde_json::Value) -> DslResult<String> {
    match json {
        serde_json::Value::String(text) => Ok(text.clone()),
        serde_json::Value::Bool(b) => Ok(python_bool(*b).to_string()),
        serde_json::Value::Number(n) if n.is_f64() => n
            .as_f64()
            .and_then(python_float)
            .ok_or_else(|| DslError::encoding(name, format!("{} has no literal form", n))),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(DslError::encoding(
            name,
            format!(
                "compound value {} cannot be used where a scalar is declared",
                shorten_repr(&other.to_string(), 40)
            ),
        )),
    }
}

fn opaque_literal(name: &str, value: &ArgValue) -> DslResult<String> {
    let json = json_value(name, value)?;
    let bytes =
        serde_json::to_vec(&json).map_err(|e| DslError::encoding(name, e.to_string()))?;
    Ok(hex::encode(bytes))
}

fn json_value(name: &str, value: &ArgValue) -> DslResult<serde_json::Value> {
    match value {
        ArgValue::String(text) => Ok(serde_json::Value::String(text.clone())),
        ArgValue::Integer(i) => Ok(serde_json::Value::from(*i)),
        ArgValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| DslError::encoding(name, format!("{} is not representable in JSON", f))),
        ArgValue::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        ArgValue::Complex(_) => Err(DslError::encoding(
            name,
            "complex numbers have no JSON representation",
        )),
        ArgValue::Opaque(json) => Ok(json.clone()),
        ArgValue::Reference(_) => Err(DslError::encoding(
            name,
            "a reference cannot be serialized as a value",
        )),
    }
}

/// Decode an opaque literal produced by [`encode`]
pub fn decode_opaque(text: &str) -> Option<serde_json::Value> {
    let bytes = hex::decode(text).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub(crate) fn python_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// Python `repr` of a float; `None` for inf/nan, which have no literal
pub(crate) fn python_float(f: f64) -> Option<String> {
    if !f.is_finite() {
        return None;
    }
    let text = python_repr_digits(f);
    if text.contains(['.', 'e']) {
        Some(text)
    } else {
        Some(format!("{}.0", text))
    }
}

/// Python `str` of a complex number: `2j`, `(1+2j)`, `(1.5-0.5j)`
pub(crate) fn python_complex(c: Complex) -> Option<String> {
    if !c.re.is_finite() || !c.im.is_finite() {
        return None;
    }
    if c.re == 0.0 && !c.re.is_sign_negative() {
        return Some(format!("{}j", python_repr_digits(c.im)));
    }
    let sign = if c.im.is_sign_negative() { '-' } else { '+' };
    Some(format!(
        "({}{}{}j)",
        python_repr_digits(c.re),
        sign,
        python_repr_digits(c.im.abs())
    ))
}

/// Shortest round-trip digits, in exponent form when the decimal exponent
/// is below -4 or at least 16 (`1e+20`, `1.5e-07`)
fn python_repr_digits(f: f64) -> String {
    let scientific = format!("{:e}", f);
    let exponent = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| exp.parse::<i32>().ok().map(|exp| (mantissa, exp)));
    match exponent {
        Some((mantissa, exp)) if f != 0.0 && !(-4..16).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        _ => f.to_string(),
    }
}

/// Truncate a value's text for logs and error messages
pub fn shorten_repr(text: &str, max_length: usize) -> String {
    match text.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}[...]", &text[..cut]),
        None => text.to_string(),
    }
}

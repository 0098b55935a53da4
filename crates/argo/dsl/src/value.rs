//! Declared types, runtime values and parameter declarations
//!
//! A [`ParameterDecl`] is the single schema source for a template: the
//! explicit builder API takes a list of them directly, and function
//! introspection produces the same list from a `def` signature.

use argo_types::ValueFrom;
use serde::{Deserialize, Serialize};

/// Declared type of a template parameter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    String,
    Integer,
    Float,
    Boolean,
    Complex,
    /// A closed set of allowed string values
    Choice(Vec<String>),
    /// Value is looked up indirectly by the engine
    Reference,
    /// Any other type; values travel hex-encoded
    Opaque(String),
}

impl TypeTag {
    pub fn choice<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choice(values.into_iter().map(Into::into).collect())
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self::Opaque(name.into())
    }

    /// Encoding category for values declared with this type
    pub fn category(&self) -> ValueCategory {
        match self {
            Self::String | Self::Choice(_) => ValueCategory::Text,
            Self::Integer | Self::Float | Self::Boolean | Self::Complex => ValueCategory::Scalar,
            Self::Reference => ValueCategory::Reference,
            Self::Opaque(_) => ValueCategory::Opaque,
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "str"),
            Self::Integer => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "bool"),
            Self::Complex => write!(f, "complex"),
            Self::Choice(values) => write!(f, "Literal[{}]", values.join(", ")),
            Self::Reference => write!(f, "ValueFrom"),
            Self::Opaque(name) => write!(f, "{}", name),
        }
    }
}

/// The rows of the encoding table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    /// Used verbatim, quoted inside generated script lines
    Text,
    /// Canonical literal text, unquoted inside generated script lines
    Scalar,
    /// Indirect lookup, never a literal
    Reference,
    /// Hex-encoded JSON, decoded by the script prologue
    Opaque,
}

/// A complex number
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

/// A value supplied as a parameter default or a step argument
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Complex(Complex),
    Reference(ValueFrom),
    Opaque(serde_json::Value),
}

impl ArgValue {
    /// Encoding category of the value itself, ignoring any declared type
    pub fn category(&self) -> ValueCategory {
        match self {
            Self::String(_) => ValueCategory::Text,
            Self::Integer(_) | Self::Float(_) | Self::Boolean(_) | Self::Complex(_) => {
                ValueCategory::Scalar
            }
            Self::Reference(_) => ValueCategory::Reference,
            Self::Opaque(_) => ValueCategory::Opaque,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Complex> for ArgValue {
    fn from(value: Complex) -> Self {
        Self::Complex(value)
    }
}

impl From<ValueFrom> for ArgValue {
    fn from(value: ValueFrom) -> Self {
        Self::Reference(value)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Opaque(value)
    }
}

/// One declared template input
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDecl {
    pub name: String,
    pub declared_type: TypeTag,
    pub default: Option<ArgValue>,
}

impl ParameterDecl {
    pub fn new(name: impl Into<String>, declared_type: TypeTag) -> Self {
        Self {
            name: name.into(),
            declared_type,
            default: None,
        }
    }

    /// An unannotated parameter, which is a string
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, TypeTag::String)
    }

    pub fn with_default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// True when the default is an indirect reference rather than a literal
    pub fn is_reference(&self) -> bool {
        self.default.as_ref().is_some_and(ArgValue::is_reference)
    }
}

/// Raw arguments of a step call, kept in call order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallArguments {
    entries: Vec<(String, ArgValue)>,
}

impl CallArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an argument; a repeated name replaces the earlier value in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ArgValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CallArguments
where
    K: Into<String>,
    V: Into<ArgValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut args = Self::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

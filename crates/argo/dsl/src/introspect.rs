//! Script-function introspection
//!
//! Reads the source text of a Python `def` and extracts what a script
//! template needs: the function name, its parameter declarations, the
//! docstring, the dedented body and the value of a trailing literal
//! `return`.
//!
//! ```text
//! @bash
//! def hello(name: str, times: int = 2):
//!     """
//!     for i in $(seq $times); do echo "hello $name"; done
//!     """
//! ```

use crate::errors::{DslError, DslResult};
use crate::literal::{parse_literal, PyLiteral};
use crate::value::{ArgValue, Complex, ParameterDecl, TypeTag};
use argo_types::{ConfigMapKeySelector, ValueFrom};
use std::collections::HashSet;
use tracing::debug;

/// Everything a script template needs from a function definition
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptFunction {
    pub name: String,
    pub parameters: Vec<ParameterDecl>,
    /// Leading string statement of the body, dedented and trimmed
    pub docstring: String,
    /// Body with the signature removed and common indentation stripped
    pub body: String,
    /// Text of a literal returned by the final statement
    pub return_value: Option<String>,
}

impl ScriptFunction {
    pub fn parse(source: &str) -> DslResult<Self> {
        let lines: Vec<&str> = source.lines().collect();

        let def_index = lines
            .iter()
            .position(|line| is_def_line(line))
            .ok_or_else(|| DslError::introspection(1, "no function definition found"))?;
        let def_line = def_index + 1;
        let def_indent = indent_width(lines[def_index]);

        let def_text = lines[def_index..].join("\n");
        let signature = Signature::split(&def_text, def_line)?;
        let (name, parameters) = parse_signature(signature.text, def_line)?;

        let body_start = def_index + signature.line_offset + 1;
        let body = extract_body(&lines[body_start..], def_indent)
            .ok_or_else(|| DslError::introspection(body_start + 1, "function body is empty"))?;

        let statements = top_level_statements(&body);
        let docstring = statements
            .first()
            .and_then(|stmt| match parse_literal(stmt) {
                Ok(PyLiteral::Str(text)) => Some(clean_docstring(&text)),
                _ => None,
            })
            .unwrap_or_default();
        let return_value = statements.last().and_then(|stmt| literal_return(stmt));

        debug!(
            function = %name,
            parameters = parameters.len(),
            has_docstring = !docstring.is_empty(),
            has_return = return_value.is_some(),
            "Introspected script function"
        );

        Ok(Self {
            name,
            parameters,
            docstring,
            body,
            return_value,
        })
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDecl> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Text used by non-Python scripts: docstring, else return value, else nothing
    pub fn script_text(&self) -> &str {
        if !self.docstring.is_empty() {
            return &self.docstring;
        }
        self.return_value.as_deref().unwrap_or("")
    }
}

/// Introspect a function definition given as source text
pub fn introspect(source: &str) -> DslResult<ScriptFunction> {
    ScriptFunction::parse(source)
}

/// Map an annotation to a declared type
///
/// `str`, `int`, `float`, `bool` and `complex` map directly; `Literal[...]`
/// is a closed choice, `ValueFrom` a reference, and `Optional[X]` or
/// `X | None` is `X`. Anything else travels as an opaque value.
pub fn type_from_annotation(annotation: &str) -> Result<TypeTag, String> {
    let annotation = unquote(annotation.trim());

    if let Some(inner) = strip_generic(annotation, &["Optional"]) {
        return type_from_annotation(inner);
    }
    if let Some(inner) = strip_generic(annotation, &["Annotated"]) {
        let first = split_top_level(inner, ',').into_iter().next().unwrap_or_default();
        return type_from_annotation(first);
    }
    if let Some(inner) = strip_generic(annotation, &["Union"]) {
        if let Some(only) = without_none(split_top_level(inner, ',')) {
            return type_from_annotation(only);
        }
    }
    let union = split_top_level(annotation, '|');
    if union.len() > 1 {
        if let Some(only) = without_none(union) {
            return type_from_annotation(only);
        }
    }

    if let Some(inner) = strip_generic(annotation, &["Literal"]) {
        let values = match parse_literal(&format!("[{}]", inner))? {
            PyLiteral::List(values) => values,
            _ => return Err(format!("malformed annotation '{}'", annotation)),
        };
        return values
            .iter()
            .map(|value| {
                value
                    .to_text()
                    .ok_or_else(|| format!("unsupported Literal value {}", value.repr()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(TypeTag::Choice);
    }

    Ok(match strip_module(annotation) {
        "str" => TypeTag::String,
        "int" => TypeTag::Integer,
        "float" => TypeTag::Float,
        "bool" => TypeTag::Boolean,
        "complex" => TypeTag::Complex,
        "ValueFrom" => TypeTag::Reference,
        _ => TypeTag::opaque(annotation),
    })
}

fn is_def_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("def ") || trimmed.starts_with("async def ")
}

fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// The `def ...:` header, found by bracket matching across lines
struct Signature<'a> {
    /// From `def` up to, not including, the closing `:`
    text: &'a str,
    /// Line of the closing `:`, relative to the `def` line
    line_offset: usize,
}

impl<'a> Signature<'a> {
    fn split(def_text: &'a str, def_line: usize) -> DslResult<Self> {
        let chars: Vec<(usize, char)> = def_text.char_indices().collect();
        let mut seen_params = false;

        let colon = scan_code(&chars, |_, c, depth| {
            if c == '(' {
                seen_params = true;
            }
            seen_params && depth == 0 && c == ':'
        })
        .ok_or_else(|| DslError::introspection(def_line, "unbalanced function signature"))?;

        let text = &def_text[..colon];
        let line_offset = text.matches('\n').count();

        let rest_of_line = def_text[colon + 1..].lines().next().unwrap_or("");
        if !is_blank_or_comment(rest_of_line) {
            return Err(DslError::introspection(
                def_line + line_offset,
                "function body must start on the line after the signature",
            ));
        }

        Ok(Self { text, line_offset })
    }
}

/// Walk source text, calling `stop` with the byte offset, the character and
/// the bracket depth before it, for every character outside strings and
/// comments.
///
/// Returns the byte offset of the first character `stop` accepts.
fn scan_code<F>(chars: &[(usize, char)], mut stop: F) -> Option<usize>
where
    F: FnMut(usize, char, usize) -> bool,
{
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            '#' => {
                while i < chars.len() && chars[i].1 != '\n' {
                    i += 1;
                }
                continue;
            }
            '"' | '\'' => {
                i = skip_string(chars, i);
                continue;
            }
            _ => {}
        }

        if stop(offset, c, depth) {
            return Some(offset);
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }

    None
}

/// Index just past the string literal opening at `start`
fn skip_string(chars: &[(usize, char)], start: usize) -> usize {
    let quote = chars[start].1;
    let at = |i: usize| chars.get(i).map(|(_, c)| *c);
    let triple = at(start + 1) == Some(quote) && at(start + 2) == Some(quote);
    let mut i = start + if triple { 3 } else { 1 };

    while i < chars.len() {
        match chars[i].1 {
            '\\' => i += 2,
            c if c == quote => {
                if !triple {
                    return i + 1;
                }
                if at(i + 1) == Some(quote) && at(i + 2) == Some(quote) {
                    return i + 3;
                }
                i += 1;
            }
            '\n' if !triple => return i,
            _ => i += 1,
        }
    }

    chars.len()
}

/// Split on `separator` at bracket depth zero, outside strings
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut cuts = Vec::new();
    scan_code(&chars, |offset, c, depth| {
        if depth == 0 && c == separator {
            cuts.push(offset);
        }
        false
    });

    let mut parts = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        parts.push(&text[start..cut]);
        start = cut + separator.len_utf8();
    }
    parts.push(&text[start..]);
    parts
}

/// First `=` at depth zero that is a keyword default, not a comparison
fn find_default_separator(text: &str) -> Option<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    scan_code(&chars, |offset, c, depth| {
        depth == 0
            && c == '='
            && !text[..offset].ends_with(['=', '!', '<', '>'])
            && !text[offset + 1..].starts_with('=')
    })
}

fn parse_signature(signature: &str, line: usize) -> DslResult<(String, Vec<ParameterDecl>)> {
    let err = |message: String| DslError::introspection(line, message);

    let after_def = signature
        .trim_start()
        .trim_start_matches("async")
        .trim_start()
        .strip_prefix("def")
        .ok_or_else(|| err("expected 'def'".into()))?
        .trim_start();

    let open = after_def
        .find('(')
        .ok_or_else(|| err("missing parameter list".into()))?;
    let name = after_def[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(err(format!("invalid function name '{}'", name)));
    }

    let params_text = &after_def[open + 1..];
    let chars: Vec<(usize, char)> = params_text.char_indices().collect();
    let close = scan_code(&chars, |_, c, depth| depth == 0 && c == ')')
        .ok_or_else(|| err("unbalanced parameter list".into()))?;

    let mut parameters = Vec::new();
    let mut seen = HashSet::new();
    for (index, raw) in split_top_level(&params_text[..close], ',')
        .into_iter()
        .enumerate()
    {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" || raw == "/" {
            continue;
        }
        if raw.starts_with('*') {
            return Err(err(format!("variadic parameter '{}' is not supported", raw)));
        }

        let (head, default) = match find_default_separator(raw) {
            Some(eq) => (raw[..eq].trim(), Some(raw[eq + 1..].trim())),
            None => (raw, None),
        };
        let (param_name, annotation) = match head.split_once(':') {
            Some((n, a)) => (n.trim(), Some(a.trim())),
            None => (head, None),
        };

        if index == 0 && (param_name == "self" || param_name == "cls") {
            continue;
        }
        if !seen.insert(param_name.to_string()) {
            return Err(err(format!("duplicate parameter '{}'", param_name)));
        }

        let declared_type = match annotation {
            Some(a) => type_from_annotation(a)
                .map_err(|e| err(format!("parameter '{}': {}", param_name, e)))?,
            None => TypeTag::String,
        };

        let mut decl = ParameterDecl::new(param_name, declared_type);
        if let Some(text) = default {
            let literal = parse_literal(text)
                .map_err(|e| err(format!("default of '{}': {}", param_name, e)))?;
            decl.default = default_value(literal)
                .map_err(|e| err(format!("default of '{}': {}", param_name, e)))?;
        }
        parameters.push(decl);
    }

    Ok((name.to_string(), parameters))
}

/// Convert a parsed default; `None` means the parameter has no default
fn default_value(literal: PyLiteral) -> Result<Option<ArgValue>, String> {
    let value = match literal {
        PyLiteral::None => return Ok(None),
        PyLiteral::Str(s) => ArgValue::String(s),
        PyLiteral::Int(i) => ArgValue::Integer(i),
        PyLiteral::Float(f) => ArgValue::Float(f),
        PyLiteral::Bool(b) => ArgValue::Boolean(b),
        PyLiteral::Complex(c) => ArgValue::Complex(Complex::new(c.re, c.im)),
        PyLiteral::Call { name, kwargs } if strip_module(&name) == "ValueFrom" => {
            ArgValue::Reference(value_from(&kwargs)?)
        }
        PyLiteral::Call { name, .. } => {
            return Err(format!("unsupported default expression '{}(...)'", name))
        }
        compound @ (PyLiteral::List(_) | PyLiteral::Dict(_)) => ArgValue::Opaque(compound.to_json()?),
    };
    Ok(Some(value))
}

fn value_from(kwargs: &[(String, PyLiteral)]) -> Result<ValueFrom, String> {
    let mut vf = ValueFrom::default();
    for (key, value) in kwargs {
        if matches!(key.as_str(), "configMapKeyRef" | "config_map_key_ref") {
            vf.config_map_key_ref = Some(config_map_key_selector(value)?);
            continue;
        }
        let text = value
            .to_text()
            .ok_or_else(|| format!("ValueFrom.{} must be a scalar", key))?;
        let slot = match key.as_str() {
            "default" => &mut vf.default,
            "event" => &mut vf.event,
            "expression" => &mut vf.expression,
            "jqFilter" | "jq_filter" => &mut vf.jq_filter,
            "jsonPath" | "json_path" => &mut vf.json_path,
            "parameter" => &mut vf.parameter,
            "path" => &mut vf.path,
            other => return Err(format!("unknown ValueFrom field '{}'", other)),
        };
        *slot = Some(text);
    }
    Ok(vf)
}

fn config_map_key_selector(literal: &PyLiteral) -> Result<ConfigMapKeySelector, String> {
    let kwargs = match literal {
        PyLiteral::Call { name, kwargs } if strip_module(name) == "ConfigMapKeySelector" => kwargs,
        other => return Err(format!("expected ConfigMapKeySelector(...), found {}", other.repr())),
    };

    let mut selector = ConfigMapKeySelector::default();
    let mut has_key = false;
    for (key, value) in kwargs {
        match (key.as_str(), value) {
            ("key", PyLiteral::Str(s)) => {
                selector.key = s.clone();
                has_key = true;
            }
            ("name", PyLiteral::Str(s)) => selector.name = Some(s.clone()),
            ("optional", PyLiteral::Bool(b)) => selector.optional = Some(*b),
            (other, _) => {
                return Err(format!("invalid ConfigMapKeySelector field '{}'", other))
            }
        }
    }
    if !has_key {
        return Err("ConfigMapKeySelector requires 'key'".into());
    }
    Ok(selector)
}

/// Body lines after the signature, ending before the first statement that
/// is indented no deeper than the `def`
fn extract_body(lines: &[&str], def_indent: usize) -> Option<String> {
    let starts = logical_line_starts(&lines.join("\n"));

    let mut end = lines.len();
    let mut offset = 0;
    for (index, line) in lines.iter().enumerate() {
        let starts_statement = starts.contains(&offset);
        offset += line.len() + 1;
        if starts_statement && !is_blank_or_comment(line) && indent_width(line) <= def_indent {
            end = index;
            break;
        }
    }

    let body = &lines[..end];
    let last = body.iter().rposition(|line| !line.trim().is_empty())?;
    Some(dedent(&body[..=last]))
}

/// Byte offsets at which a new logical line starts
///
/// Newlines inside strings, brackets or after a `\` continuation do not
/// start one.
fn logical_line_starts(text: &str) -> HashSet<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut starts = HashSet::from([0]);
    scan_code(&chars, |offset, c, depth| {
        if c == '\n' && depth == 0 && !text[..offset].ends_with('\\') {
            starts.insert(offset + 1);
        }
        false
    });
    starts
}

fn dedent(lines: &[&str]) -> String {
    let margin = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(common_prefix)
        .unwrap_or("");

    let mut out = String::new();
    for line in lines {
        if !line.trim().is_empty() {
            out.push_str(line.strip_prefix(margin).unwrap_or(line).trim_end());
        }
        out.push('\n');
    }
    out
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(0);
    &a[..len]
}

/// Statements of the dedented body that start at column zero
fn top_level_statements(body: &str) -> Vec<String> {
    let starts = logical_line_starts(body);
    let mut statements: Vec<String> = Vec::new();
    let mut offset = 0;

    for line in body.split('\n') {
        let starts_here = starts.contains(&offset);
        offset += line.len() + 1;

        if starts_here {
            if is_blank_or_comment(line) {
                continue;
            }
            if indent_width(line) == 0 {
                statements.push(line.to_string());
                continue;
            }
        }
        if let Some(current) = statements.last_mut() {
            current.push('\n');
            current.push_str(line);
        }
    }

    statements
}

/// Cleaned docstring text: first line stripped, the rest dedented, trimmed
fn clean_docstring(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or("").trim().to_string();
    let rest: Vec<&str> = lines.collect();
    let rest = dedent(&rest);

    let joined = if first.is_empty() {
        rest
    } else {
        format!("{}\n{}", first, rest)
    };
    joined.trim().to_string()
}

fn literal_return(statement: &str) -> Option<String> {
    let expr = statement.strip_prefix("return")?;
    if !expr.starts_with(|c: char| c.is_whitespace() || c == '(') {
        return None;
    }
    match parse_literal(expr.trim()).ok()? {
        PyLiteral::Str(text) => Some(text),
        PyLiteral::None | PyLiteral::Call { .. } => None,
        literal @ (PyLiteral::List(_) | PyLiteral::Dict(_)) => Some(literal.repr()),
        scalar => scalar.to_text(),
    }
}

fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    text
}

/// `typing.Literal` and `typing_extensions.Literal` are `Literal`
fn strip_module(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name).trim()
}

fn strip_generic<'a>(annotation: &'a str, names: &[&str]) -> Option<&'a str> {
    let open = annotation.find('[')?;
    let head = strip_module(&annotation[..open]);
    if !names.contains(&head) {
        return None;
    }
    annotation[open + 1..].trim_end().strip_suffix(']').map(str::trim)
}

fn without_none(parts: Vec<&str>) -> Option<&str> {
    let rest: Vec<&str> = parts
        .into_iter()
        .map(str::trim)
        .filter(|p| *p != "None" && *p != "NoneType")
        .collect();
    match rest.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

//! Python literal parsing for parameter defaults and return values
//!
//! Covers the literal forms that appear in script-function signatures:
//! strings (quoted, triple-quoted, raw, implicitly concatenated), ints,
//! floats, imaginary and `a+bj` complex numbers, `True`/`False`/`None`,
//! lists, tuples, dicts, and calls with keyword arguments
//! (`ValueFrom(default="x")`).

use crate::encoder::{python_bool, python_complex, python_float};
use crate::value::Complex;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PyLiteral {
    Str(String),
    Int(i64),
    Float(f64),
    Complex(Complex),
    Bool(bool),
    None,
    List(Vec<PyLiteral>),
    Dict(Vec<(PyLiteral, PyLiteral)>),
    Call {
        name: String,
        kwargs: Vec<(String, PyLiteral)>,
    },
}

impl PyLiteral {
    /// Text used when the literal stands for a script or an enum value
    pub(crate) fn to_text(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => python_float(*f),
            Self::Complex(c) => python_complex(*c),
            Self::Bool(b) => Some(python_bool(*b).to_string()),
            _ => None,
        }
    }

    /// Python `repr` of the literal, as `str()` shows it inside containers
    pub(crate) fn repr(&self) -> String {
        match self {
            Self::Str(s) => {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('\'', "\\'")
                    .replace('\n', "\\n")
                    .replace('\t', "\\t");
                format!("'{}'", escaped)
            }
            Self::None => "None".to_string(),
            Self::List(items) => format!(
                "[{}]",
                items.iter().map(Self::repr).collect::<Vec<_>>().join(", ")
            ),
            Self::Dict(entries) => format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Call { name, kwargs } => format!(
                "{}({})",
                name,
                kwargs
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            other => other.to_text().unwrap_or_default(),
        }
    }

    pub(crate) fn to_json(&self) -> Result<serde_json::Value, String> {
        match self {
            Self::Str(s) => Ok(serde_json::Value::String(s.clone())),
            Self::Int(i) => Ok(serde_json::Value::from(*i)),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| format!("{} is not representable in JSON", f)),
            Self::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Self::None => Ok(serde_json::Value::Null),
            Self::List(items) => items
                .iter()
                .map(Self::to_json)
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            Self::Dict(entries) => {
                let mut map = serde_json::Map::new();
                for (key, value) in entries {
                    let key = match key {
                        Self::Str(s) => s.clone(),
                        other => match other.to_text() {
                            Some(text) => text,
                            None => return Err("dict keys must be scalars".into()),
                        },
                    };
                    map.insert(key, value.to_json()?);
                }
                Ok(serde_json::Value::Object(map))
            }
            Self::Complex(_) => Err("complex numbers have no JSON representation".into()),
            Self::Call { name, .. } => Err(format!("call to '{}' is not a literal", name)),
        }
    }
}

/// Parse a complete Python literal expression
pub(crate) fn parse_literal(input: &str) -> Result<PyLiteral, String> {
    let mut parser = LiteralParser::new(input);
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(format!(
            "unexpected trailing input '{}'",
            parser.remaining().trim()
        ));
    }
    Ok(value)
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn remaining(&self) -> String {
        self.chars[self.pos.min(self.chars.len())..].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '\\' {
                self.pos += 1;
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(format!("expected '{}', found '{}'", expected, c)),
            None => Err(format!("expected '{}', found end of input", expected)),
        }
    }

    fn parse_value(&mut self) -> Result<PyLiteral, String> {
        self.skip_whitespace();
        let c = self.peek().ok_or("unexpected end of input")?;

        match c {
            '"' | '\'' => self.parse_strings(),
            'r' | 'R' | 'u' | 'U' if matches!(self.peek_at(1), Some('"') | Some('\'')) => {
                self.parse_strings()
            }
            '[' => self.parse_sequence('[', ']').map(PyLiteral::List),
            '(' => self.parse_paren(),
            '{' => self.parse_dict(),
            '-' | '+' => self.parse_number(),
            c if c.is_ascii_digit() => self.parse_number(),
            '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.parse_number(),
            c if c.is_alphabetic() || c == '_' => self.parse_name(),
            other => Err(format!("unexpected character '{}'", other)),
        }
    }

    /// One or more adjacent string literals, concatenated
    fn parse_strings(&mut self) -> Result<PyLiteral, String> {
        let mut text = self.parse_string()?;
        loop {
            let save = self.pos;
            self.skip_whitespace();
            let next = self.peek();
            let prefixed = matches!(next, Some('r' | 'R' | 'u' | 'U'))
                && matches!(self.peek_at(1), Some('"' | '\''));
            if matches!(next, Some('"' | '\'')) || prefixed {
                text.push_str(&self.parse_string()?);
            } else {
                self.pos = save;
                return Ok(PyLiteral::Str(text));
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, String> {
        let mut raw = false;
        while let Some(c) = self.peek() {
            match c {
                'r' | 'R' => {
                    raw = true;
                    self.pos += 1;
                }
                'u' | 'U' => self.pos += 1,
                _ => break,
            }
        }

        let quote = self.peek().ok_or("unexpected end of input")?;
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut text = String::new();
        loop {
            let c = self.peek().ok_or("unterminated string literal")?;
            if c == quote {
                if !triple {
                    self.pos += 1;
                    return Ok(text);
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    return Ok(text);
                }
            }
            if c == '\n' && !triple {
                return Err("unterminated string literal".into());
            }
            if c == '\\' {
                let next = self.peek_at(1).ok_or("unterminated string literal")?;
                self.pos += 2;
                if raw {
                    text.push('\\');
                    text.push(next);
                } else {
                    self.push_escape(&mut text, next)?;
                }
                continue;
            }
            text.push(c);
            self.pos += 1;
        }
    }

    fn push_escape(&mut self, text: &mut String, escape: char) -> Result<(), String> {
        match escape {
            'n' => text.push('\n'),
            't' => text.push('\t'),
            'r' => text.push('\r'),
            '0' => text.push('\0'),
            '\\' => text.push('\\'),
            '\'' => text.push('\''),
            '"' => text.push('"'),
            '\n' => {}
            'x' => text.push(self.read_hex_escape(2)?),
            'u' => text.push(self.read_hex_escape(4)?),
            'U' => text.push(self.read_hex_escape(8)?),
            other => {
                text.push('\\');
                text.push(other);
            }
        }
        Ok(())
    }

    fn read_hex_escape(&mut self, digits: usize) -> Result<char, String> {
        let end = self.pos + digits;
        if end > self.chars.len() {
            return Err("truncated escape sequence".into());
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("invalid escape sequence '{}'", hex))
    }

    fn parse_number(&mut self) -> Result<PyLiteral, String> {
        let real = self.parse_signed_number()?;

        // `1+2j` is an addition in Python, but it is how complex defaults are written
        if let PyLiteral::Int(_) | PyLiteral::Float(_) = real {
            let save = self.pos;
            self.skip_whitespace();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                self.pos += 1;
                self.skip_whitespace();
                if let Ok(PyLiteral::Complex(imag)) = self.parse_unsigned_number() {
                    let re = match real {
                        PyLiteral::Int(i) => i as f64,
                        PyLiteral::Float(f) => f,
                        _ => 0.0,
                    };
                    let im = if sign == '-' { -imag.im } else { imag.im };
                    return Ok(PyLiteral::Complex(Complex::new(re, im)));
                }
            }
            self.pos = save;
        }

        Ok(real)
    }

    fn parse_signed_number(&mut self) -> Result<PyLiteral, String> {
        let mut negative = false;
        while let Some(sign @ ('+' | '-')) = self.peek() {
            if sign == '-' {
                negative = !negative;
            }
            self.pos += 1;
            self.skip_whitespace();
        }

        let value = self.parse_unsigned_number()?;
        if !negative {
            return Ok(value);
        }
        Ok(match value {
            PyLiteral::Int(i) => PyLiteral::Int(-i),
            PyLiteral::Float(f) => PyLiteral::Float(-f),
            PyLiteral::Complex(c) => PyLiteral::Complex(Complex::new(-c.re, -c.im)),
            other => other,
        })
    }

    fn parse_unsigned_number(&mut self) -> Result<PyLiteral, String> {
        let start = self.pos;

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            let radix = match self.peek_at(1) {
                Some('x' | 'X') => 16,
                Some('o' | 'O') => 8,
                _ => 2,
            };
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.pos += 1;
            }
            let digits: String = self.chars[digits_start..self.pos]
                .iter()
                .filter(|c| **c != '_')
                .collect();
            return i64::from_str_radix(&digits, radix)
                .map(PyLiteral::Int)
                .map_err(|e| format!("invalid integer literal: {}", e));
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => self.pos += 1,
                '.' => {
                    is_float = true;
                    self.pos += 1;
                }
                'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }

        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        if text.is_empty() {
            return Err("expected a number".into());
        }

        if matches!(self.peek(), Some('j' | 'J')) {
            self.pos += 1;
            let im = text
                .parse::<f64>()
                .map_err(|e| format!("invalid imaginary literal '{}': {}", text, e))?;
            return Ok(PyLiteral::Complex(Complex::new(0.0, im)));
        }

        if is_float {
            text.parse::<f64>()
                .map(PyLiteral::Float)
                .map_err(|e| format!("invalid float literal '{}': {}", text, e))
        } else {
            text.parse::<i64>()
                .map(PyLiteral::Int)
                .map_err(|e| format!("invalid integer literal '{}': {}", text, e))
        }
    }

    fn parse_name(&mut self) -> Result<PyLiteral, String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        match name.as_str() {
            "True" => return Ok(PyLiteral::Bool(true)),
            "False" => return Ok(PyLiteral::Bool(false)),
            "None" => return Ok(PyLiteral::None),
            _ => {}
        }

        self.skip_whitespace();
        if self.peek() != Some('(') {
            return Err(format!("'{}' is not a literal", name));
        }
        self.pos += 1;

        let mut kwargs = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(')') {
                self.pos += 1;
                break;
            }
            let key_start = self.pos;
            while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
                self.pos += 1;
            }
            let key: String = self.chars[key_start..self.pos].iter().collect();
            if key.is_empty() {
                return Err(format!("'{}' accepts keyword arguments only", name));
            }
            self.skip_whitespace();
            if self.peek() != Some('=') {
                return Err(format!("'{}' accepts keyword arguments only", name));
            }
            self.pos += 1;
            let value = self.parse_value()?;
            kwargs.push((key, value));

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => {}
                _ => return Err(format!("expected ',' or ')' in call to '{}'", name)),
            }
        }

        Ok(PyLiteral::Call { name, kwargs })
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Result<Vec<PyLiteral>, String> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => {}
                _ => return Err(format!("expected ',' or '{}'", close)),
            }
        }
    }

    /// A tuple, or a parenthesized expression when there is no comma
    fn parse_paren(&mut self) -> Result<PyLiteral, String> {
        self.expect('(')?;
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek() == Some(')') {
                self.pos += 1;
                break;
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    saw_comma = true;
                    self.pos += 1;
                }
                Some(')') => {}
                _ => return Err("expected ',' or ')'".into()),
            }
        }

        if items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(PyLiteral::List(items))
    }

    fn parse_dict(&mut self) -> Result<PyLiteral, String> {
        self.expect('{')?;
        let mut entries = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(PyLiteral::Dict(entries));
            }
            let key = self.parse_value()?;
            self.expect(':')?;
            let value = self.parse_value()?;
            entries.push((key, value));
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {}
                _ => return Err("expected ',' or '}'".into()),
            }
        }
    }
}

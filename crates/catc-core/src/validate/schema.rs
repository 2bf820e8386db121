// Static field specifications and the walker that checks a document
// against them.
//
// The walker never stops at the first problem: every offending field is
// recorded and the coerced value is rebuilt from whatever was valid.

use serde_json::{Map, Number, Value};

use crate::config::State;
use crate::error::Violation;

/// Allowed characters for constrained strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Charset {
    /// `[A-Za-z0-9_]`
    Word,
    /// `[A-Za-z0-9_-]`
    WordDash,
}

impl Charset {
    fn allows(self, c: char) -> bool {
        match self {
            Self::Word => c.is_ascii_alphanumeric() || c == '_',
            Self::WordDash => c.is_ascii_alphanumeric() || c == '_' || c == '-',
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Word => "letters, digits and underscores",
            Self::WordDash => "letters, digits, underscores and hyphens",
        }
    }
}

/// Expected shape of one value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Ty {
    Str {
        min: usize,
        max: usize,
        charset: Option<Charset>,
    },
    Int {
        min: i64,
        max: i64,
    },
    Float {
        min: f64,
        max: f64,
    },
    Bool,
    /// Case-insensitive; coerced to the listed spelling.
    Enum(&'static [&'static str]),
    /// A scalar is accepted as a one-element list.
    List(&'static Ty),
    Map(&'static [Field]),
}

/// Any non-empty string.
pub(crate) const TEXT: Ty = Ty::Str {
    min: 1,
    max: usize::MAX,
    charset: None,
};

pub(crate) const TEXT_LIST: Ty = Ty::List(&TEXT);

/// When a field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Req {
    Always,
    /// Only under merged intent.
    Merged,
    Optional,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    pub name: &'static str,
    pub ty: Ty,
    pub req: Req,
}

impl Field {
    pub(crate) const fn required(name: &'static str, ty: Ty) -> Self {
        Self {
            name,
            ty,
            req: Req::Always,
        }
    }

    pub(crate) const fn merged(name: &'static str, ty: Ty) -> Self {
        Self {
            name,
            ty,
            req: Req::Merged,
        }
    }

    pub(crate) const fn optional(name: &'static str, ty: Ty) -> Self {
        Self {
            name,
            ty,
            req: Req::Optional,
        }
    }
}

/// Walks values against `Ty`s, collecting violations.
pub(crate) struct Checker<'a> {
    pub state: State,
    pub violations: &'a mut Vec<Violation>,
}

impl Checker<'_> {
    fn violation(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    /// Check `value` against `ty`; returns the coerced value when valid.
    pub(crate) fn check(&mut self, value: &Value, ty: &Ty, path: &str) -> Option<Value> {
        match *ty {
            Ty::Str { min, max, charset } => self.check_str(value, min, max, charset, path),
            Ty::Int { min, max } => self.check_int(value, min, max, path),
            Ty::Float { min, max } => self.check_float(value, min, max, path),
            Ty::Bool => self.check_bool(value, path),
            Ty::Enum(choices) => self.check_enum(value, choices, path),
            Ty::List(inner) => self.check_list(value, inner, path),
            Ty::Map(fields) => self.check_map(value, fields, path),
        }
    }

    pub(crate) fn check_map(
        &mut self,
        value: &Value,
        fields: &[Field],
        path: &str,
    ) -> Option<Value> {
        let Some(map) = value.as_object() else {
            self.violation(path, "expected a mapping");
            return None;
        };

        let before = self.violations.len();
        for key in map.keys() {
            if !fields.iter().any(|f| f.name == key) {
                self.violation(&format!("{path}.{key}"), "unknown field");
            }
        }

        let mut out = Map::new();
        for field in fields {
            let field_path = format!("{path}.{}", field.name);
            match map.get(field.name) {
                None | Some(Value::Null) => {
                    let needed = match field.req {
                        Req::Always => true,
                        Req::Merged => self.state == State::Merged,
                        Req::Optional => false,
                    };
                    if needed {
                        self.violation(&field_path, "is required");
                    }
                }
                Some(v) => {
                    if let Some(coerced) = self.check(v, &field.ty, &field_path) {
                        out.insert(field.name.to_owned(), coerced);
                    }
                }
            }
        }

        (self.violations.len() == before).then_some(Value::Object(out))
    }

    fn check_list(&mut self, value: &Value, inner: &Ty, path: &str) -> Option<Value> {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            scalar => vec![scalar],
        };
        let before = self.violations.len();
        let out: Vec<Value> = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| self.check(item, inner, &format!("{path}[{i}]")))
            .collect();
        (self.violations.len() == before).then_some(Value::Array(out))
    }

    fn check_str(
        &mut self,
        value: &Value,
        min: usize,
        max: usize,
        charset: Option<Charset>,
        path: &str,
    ) -> Option<Value> {
        let Some(text) = scalar_text(value) else {
            self.violation(path, "expected a string");
            return None;
        };
        let len = text.chars().count();
        if len < min {
            self.violation(path, format!("must be at least {min} character(s)"));
            return None;
        }
        if len > max {
            self.violation(path, format!("must be at most {max} characters"));
            return None;
        }
        if let Some(charset) = charset {
            if let Some(bad) = text.chars().find(|c| !charset.allows(*c)) {
                self.violation(
                    path,
                    format!("invalid character '{bad}': only {} allowed", charset.describe()),
                );
                return None;
            }
        }
        Some(Value::String(text))
    }

    fn check_int(&mut self, value: &Value, min: i64, max: i64, path: &str) -> Option<Value> {
        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let Some(n) = parsed else {
            self.violation(path, "expected an integer");
            return None;
        };
        if !(min..=max).contains(&n) {
            self.violation(path, format!("must be between {min} and {max}"));
            return None;
        }
        Some(Value::Number(n.into()))
    }

    fn check_float(&mut self, value: &Value, min: f64, max: f64, path: &str) -> Option<Value> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(x) = parsed.filter(|x| x.is_finite()) else {
            self.violation(path, "expected a number");
            return None;
        };
        if x < min || x > max {
            self.violation(path, format!("must be between {min:.2} and {max:.2}"));
            return None;
        }
        Number::from_f64(x).map(Value::Number)
    }

    fn check_bool(&mut self, value: &Value, path: &str) -> Option<Value> {
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Some(true),
                "false" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.violation(path, "expected a boolean");
        }
        parsed.map(Value::Bool)
    }

    fn check_enum(
        &mut self,
        value: &Value,
        choices: &'static [&'static str],
        path: &str,
    ) -> Option<Value> {
        let matched = scalar_text(value).and_then(|text| {
            let text = text.trim().to_owned();
            choices
                .iter()
                .find(|choice| choice.eq_ignore_ascii_case(&text))
        });
        if let Some(choice) = matched {
            Some(Value::String((*choice).to_owned()))
        } else {
            self.violation(path, format!("must be one of: {}", choices.join(", ")));
            None
        }
    }
}

/// Strings as-is; numbers and booleans rendered; anything else rejected.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

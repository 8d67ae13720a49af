//! Declarative request validation: per-field rules, custom messages, uniqueness probe.

use super::ResourceService;
use crate::config::ColumnType;
use crate::error::{AppError, ValidationErrors};
use crate::resource::Resource;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Numeric,
    Integer,
}

/// Rules for one input field.
#[derive(Clone, Debug)]
pub struct FieldRules {
    field: &'static str,
    required: bool,
    nullable: bool,
    ty: Option<FieldType>,
    max_length: Option<usize>,
    minimum: Option<Decimal>,
    maximum: Option<Decimal>,
    url: bool,
    /// Column that must not already hold this value (the record being updated is ignored).
    unique: Option<&'static str>,
}

impl FieldRules {
    pub fn new(field: &'static str) -> Self {
        FieldRules {
            field,
            required: false,
            nullable: false,
            ty: None,
            max_length: None,
            minimum: None,
            maximum: None,
            url: false,
            unique: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn string(mut self) -> Self {
        self.ty = Some(FieldType::String);
        self
    }

    pub fn numeric(mut self) -> Self {
        self.ty = Some(FieldType::Numeric);
        self
    }

    pub fn integer(mut self) -> Self {
        self.ty = Some(FieldType::Integer);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn min(mut self, n: i64) -> Self {
        self.minimum = Some(Decimal::from(n));
        self
    }

    pub fn max(mut self, n: Decimal) -> Self {
        self.maximum = Some(n);
        self
    }

    /// Bound the value by what the column can store. Explicit `min`/`max` take precedence.
    pub fn within(mut self, ty: ColumnType) -> Self {
        if let Some((min, max)) = ty.range() {
            self.minimum.get_or_insert(min);
            self.maximum.get_or_insert(max);
        }
        self
    }

    pub fn url(mut self) -> Self {
        self.url = true;
        self
    }

    pub fn unique(mut self, column: &'static str) -> Self {
        self.unique = Some(column);
        self
    }
}

/// A named rule set with optional `field.rule` message overrides.
#[derive(Clone, Debug)]
pub struct RequestSchema {
    name: &'static str,
    rules: Vec<FieldRules>,
    messages: HashMap<String, String>,
}

impl RequestSchema {
    pub fn new(name: &'static str) -> Self {
        RequestSchema {
            name,
            rules: Vec::new(),
            messages: HashMap::new(),
        }
    }

    pub fn field(mut self, rules: FieldRules) -> Self {
        self.rules.push(rules);
        self
    }

    /// Override the message for `field.rule`, e.g. `sku.unique`.
    pub fn message(mut self, key: &str, text: &str) -> Self {
        self.messages.insert(key.to_string(), text.to_string());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.field)
    }

    fn msg(&self, field: &str, rule: &str, default: String) -> String {
        self.messages
            .get(&format!("{}.{}", field, rule))
            .cloned()
            .unwrap_or(default)
    }
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i)(https?|ftp)://[^\s/?#]+([/?#]\S*)?$").expect("static url pattern")
    })
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

fn as_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate `body` against `schema`, collecting every failing rule per field.
    /// Returns only the fields the schema declares, with integers normalized to numbers.
    /// `ignore_id` is the record being updated, excluded from uniqueness checks.
    pub async fn validate<R, S>(
        body: &Map<String, Value>,
        schema: &RequestSchema,
        service: &S,
        ignore_id: Option<i64>,
    ) -> Result<Map<String, Value>, AppError>
    where
        R: Resource,
        S: ResourceService<R> + ?Sized,
    {
        let mut errors = ValidationErrors::new();
        let mut validated = Map::new();

        for rule in &schema.rules {
            let f = rule.field;
            let value = body.get(f);
            let missing = match value {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                _ => false,
            };
            if missing {
                if rule.required {
                    errors.add(f, schema.msg(f, "required", format!("The {} field is required.", label(f))));
                } else if value.is_some() && rule.nullable {
                    validated.insert(f.to_string(), Value::Null);
                }
                continue;
            }
            let Some(value) = value else { continue };
            let value = match rule.ty {
                Some(FieldType::String) if !value.is_string() => {
                    errors.add(f, schema.msg(f, "string", format!("The {} field must be a string.", label(f))));
                    continue;
                }
                Some(FieldType::Numeric) if as_decimal(value).is_none() => {
                    errors.add(f, schema.msg(f, "numeric", format!("The {} field must be a number.", label(f))));
                    continue;
                }
                Some(FieldType::Integer) => match as_integer(value) {
                    Some(n) => Value::from(n),
                    None => {
                        errors.add(f, schema.msg(f, "integer", format!("The {} field must be an integer.", label(f))));
                        continue;
                    }
                },
                _ => value.clone(),
            };

            if let (Some(max), Some(s)) = (rule.max_length, value.as_str()) {
                if s.chars().count() > max {
                    errors.add(
                        f,
                        schema.msg(f, "max", format!("The {} field must not be greater than {} characters.", label(f), max)),
                    );
                }
            }
            if let Some(min) = rule.minimum {
                if as_decimal(&value).map_or(false, |n| n < min) {
                    errors.add(f, schema.msg(f, "min", format!("The {} field must be at least {}.", label(f), min)));
                }
            }
            if let Some(max) = rule.maximum {
                if as_decimal(&value).map_or(false, |n| n > max) {
                    errors.add(f, schema.msg(f, "max", format!("The {} field must not be greater than {}.", label(f), max)));
                }
            }
            if rule.url && !value.as_str().map_or(false, |s| url_regex().is_match(s)) {
                errors.add(f, schema.msg(f, "url", format!("The {} field must be a valid URL.", label(f))));
            }
            let clean = errors.get(f).is_none();
            if let (Some(column), true) = (rule.unique, clean) {
                if service.is_taken(column, &value, ignore_id).await? {
                    errors.add(f, schema.msg(f, "unique", format!("The {} has already been taken.", label(f))));
                }
            }
            validated.insert(f.to_string(), value);
        }

        if !errors.is_empty() {
            tracing::debug!(schema = schema.name(), fields = ?errors.fields().collect::<Vec<_>>(), "validation failed");
        }
        errors.into_result()?;
        Ok(validated)
    }
}

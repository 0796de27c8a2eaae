//! Declarative field schemas for JSON request payloads.

use crate::ValidationResult;
use amazon_error::{AmazonError, AmazonResult};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// JSON type a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FieldType {
    /// JSON string
    String,
    /// Any JSON number
    Number,
    /// JSON number without a fractional part
    Integer,
    /// JSON boolean
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

/// Custom check: `Err(message)` marks the field invalid.
pub type CustomCheck = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Constraints for one field, addressed by a dotted path (`"filter.asin"`).
///
/// # Examples
///
/// ```
/// use amazon_validation::{FieldRule, FieldType};
///
/// let rule = FieldRule::new("keywords")
///     .required()
///     .of_type(FieldType::String)
///     .length(1, 200);
/// assert_eq!(rule.field(), "keywords");
/// ```
#[derive(Clone)]
pub struct FieldRule {
    field: String,
    required: bool,
    field_type: Option<FieldType>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<Regex>,
    allowed: Vec<Value>,
    custom: Option<(String, CustomCheck)>,
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("field", &self.field)
            .field("required", &self.required)
            .field("field_type", &self.field_type)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .finish_non_exhaustive()
    }
}

impl FieldRule {
    /// Start a rule for `field`. Fields are optional until [`required`](Self::required).
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            required: false,
            field_type: None,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            pattern: None,
            allowed: Vec::new(),
            custom: None,
        }
    }

    /// Dotted path of the field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Field must be present and non-null.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Field must have JSON type `field_type`.
    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// String length (in chars) or array length bounds, inclusive.
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    /// Minimum string or array length.
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Maximum string or array length.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Numeric bounds, inclusive.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// String values must match `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `pattern` is not a valid regex.
    pub fn pattern(mut self, pattern: &str) -> AmazonResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            AmazonError::config(format!("Invalid pattern for field '{}': {}", self.field, e))
        })?;
        self.pattern = Some(regex);
        Ok(self)
    }

    /// Value must equal one of `allowed`.
    pub fn one_of<I, V>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = allowed.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a custom check reported under `code` when it fails.
    pub fn custom<F>(mut self, code: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.custom = Some((code.into(), Arc::new(check)));
        self
    }

    fn check(&self, data: &Value, result: &mut ValidationResult) {
        let field = self.field.as_str();
        let value = match lookup(data, field) {
            Some(Value::Null) | None => {
                if self.required {
                    result.push_error(field, "REQUIRED_FIELD_MISSING", "is required");
                }
                return;
            }
            Some(value) => value,
        };

        if let Some(field_type) = self.field_type
            && !field_type.matches(value)
        {
            result.push_invalid(field, shown(value), "INVALID_TYPE", format!("must be of type {}", field_type));
            // Remaining checks assume the declared type
            return;
        }

        let length = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };
        if let Some(length) = length {
            if let Some(min) = self.min_length
                && length < min
            {
                result.push_invalid(field, shown(value), "LENGTH_TOO_SHORT", format!("must have at least {} items or characters", min));
            }
            if let Some(max) = self.max_length
                && length > max
            {
                result.push_invalid(field, shown(value), "LENGTH_TOO_LONG", format!("must have at most {} items or characters", max));
            }
        }

        if let Some(number) = value.as_f64() {
            if let Some(min) = self.min
                && number < min
            {
                result.push_invalid(field, shown(value), "VALUE_TOO_SMALL", format!("must be at least {}", min));
            }
            if let Some(max) = self.max
                && number > max
            {
                result.push_invalid(field, shown(value), "VALUE_TOO_LARGE", format!("must be at most {}", max));
            }
        }

        if let (Some(pattern), Some(s)) = (&self.pattern, value.as_str())
            && !pattern.is_match(s)
        {
            result.push_invalid(field, shown(value), "PATTERN_MISMATCH", format!("must match {}", pattern.as_str()));
        }

        if !self.allowed.is_empty() && !self.allowed.contains(value) {
            let allowed = self
                .allowed
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            result.push_invalid(field, shown(value), "INVALID_ENUM_VALUE", format!("must be one of [{}]", allowed));
        }

        if let Some((code, check)) = &self.custom
            && let Err(message) = check(value)
        {
            result.push_invalid(field, shown(value), code.clone(), message);
        }
    }
}

/// Strings unquoted, everything else as compact JSON.
fn shown(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |current, segment| current.get(segment))
}

/// Ordered set of field rules.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: Vec<FieldRule>,
}

impl Schema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule.
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

/// Validates JSON payloads against a [`Schema`].
///
/// # Examples
///
/// ```
/// use amazon_validation::{FieldRule, FieldType, Schema, SchemaValidator};
/// use serde_json::json;
///
/// let schema = Schema::new()
///     .field(FieldRule::new("ItemCount").of_type(FieldType::Integer).range(1.0, 10.0))
///     .field(FieldRule::new("Keywords").required().of_type(FieldType::String));
///
/// let result = SchemaValidator::validate(&json!({"ItemCount": 25}), &schema);
/// assert!(!result.is_valid());
/// assert_eq!(result.errors().len(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Check every rule and collect all violations.
    #[instrument(skip_all, fields(rules = schema.rules.len()))]
    pub fn validate(data: &Value, schema: &Schema) -> ValidationResult {
        let mut result = ValidationResult::default();
        for rule in &schema.rules {
            rule.check(data, &mut result);
        }
        debug!(
            errors = result.errors().len(),
            warnings = result.warnings().len(),
            "Schema validation finished"
        );
        result
    }
}

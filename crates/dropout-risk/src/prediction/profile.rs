use super::schema::{FieldId, FieldSchema, UnknownField};
use std::collections::BTreeMap;

/// Value substituted for numeric input that is empty or not a finite number.
pub const NUMERIC_DEFAULT: f64 = 0.0;

/// Named default-substitution rule for operator-entered numbers.
///
/// Surrounding whitespace is ignored. Empty text, unparseable text, `NaN` and
/// infinities all become [`NUMERIC_DEFAULT`] instead of an error.
pub fn parse_numeric_or_default(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(NUMERIC_DEFAULT)
}

/// Current value held for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileValue {
    Choice(String),
    Number(f64),
}

/// Operator-owned form state for a single prediction attempt.
///
/// Each field holds at most one value, so a categorical field can never carry
/// two selections at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentProfile {
    values: BTreeMap<FieldId, ProfileValue>,
}

impl StudentProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a categorical selection. An empty key clears the field.
    pub fn select(&mut self, field: FieldId, option_key: impl Into<String>) {
        let option_key = option_key.into();
        if option_key.is_empty() {
            self.values.remove(&field);
        } else {
            self.values.insert(field, ProfileValue::Choice(option_key));
        }
    }

    pub fn set_number(&mut self, field: FieldId, value: f64) {
        let value = if value.is_finite() {
            value
        } else {
            NUMERIC_DEFAULT
        };
        self.values.insert(field, ProfileValue::Number(value));
    }

    pub fn clear(&mut self, field: FieldId) {
        self.values.remove(&field);
    }

    /// Applies raw text from an input control, routed by the field's kind.
    ///
    /// Numeric fields go through [`parse_numeric_or_default`]; categorical
    /// fields store the text as the selected option key.
    pub fn apply_raw(&mut self, schema: &FieldSchema, field: FieldId, raw: &str) {
        let numeric = schema
            .field(field)
            .map(|descriptor| descriptor.is_numeric())
            .unwrap_or(false);

        if numeric {
            self.set_number(field, parse_numeric_or_default(raw));
        } else {
            self.select(field, raw.trim());
        }
    }

    /// Parses `field=value` input, as typed on the command line.
    pub fn apply_assignment(
        &mut self,
        schema: &FieldSchema,
        assignment: &str,
    ) -> Result<FieldId, ProfileInputError> {
        let (name, raw) = assignment
            .split_once('=')
            .ok_or_else(|| ProfileInputError::MissingValue(assignment.to_string()))?;
        let field: FieldId = name.parse()?;
        self.apply_raw(schema, field, raw);
        Ok(field)
    }

    pub fn selection(&self, field: FieldId) -> Option<&str> {
        match self.values.get(&field) {
            Some(ProfileValue::Choice(key)) => Some(key.as_str()),
            _ => None,
        }
    }

    /// Numeric value for the field, or [`NUMERIC_DEFAULT`] when none was entered.
    pub fn number(&self, field: FieldId) -> f64 {
        match self.values.get(&field) {
            Some(ProfileValue::Number(value)) => *value,
            _ => NUMERIC_DEFAULT,
        }
    }

    pub fn get(&self, field: FieldId) -> Option<&ProfileValue> {
        self.values.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileInputError {
    #[error(transparent)]
    UnknownField(#[from] UnknownField),
    #[error("expected <field>=<value>, got '{0}'")]
    MissingValue(String),
}

//! Declarative answer schema and validation

use super::values::{AnswerValue, Answers, RawAnswers, ValidatedAnswers};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Decides whether a field applies, given the answers to earlier fields
pub type Predicate = fn(&Answers) -> bool;

/// Allowed values for a field
#[derive(Clone)]
pub enum ValueDomain {
    /// Free-form string accepted by `accepts`
    Text { accepts: fn(&str) -> bool },
    /// Exactly one of the listed choices
    Choice(&'static [&'static str]),
    /// Any subset of the listed choices (possibly empty)
    MultiSelect(&'static [&'static str]),
}

impl ValueDomain {
    /// Declared choices; empty for free-form text
    pub fn choices(&self) -> &'static [&'static str] {
        match self {
            ValueDomain::Text { .. } => &[],
            ValueDomain::Choice(c) | ValueDomain::MultiSelect(c) => *c,
        }
    }

    fn check(&self, raw: &Value) -> Result<AnswerValue, ValidationReason> {
        match (self, raw) {
            (_, Value::Null) => Err(ValidationReason::Missing),
            (ValueDomain::Text { accepts }, Value::String(s)) => {
                if accepts(s.as_str()) {
                    Ok(AnswerValue::Text(s.clone()))
                } else {
                    Err(ValidationReason::OutOfDomain)
                }
            }
            (ValueDomain::Choice(choices), Value::String(s)) => {
                if choices.contains(&s.as_str()) {
                    Ok(AnswerValue::Text(s.clone()))
                } else {
                    Err(ValidationReason::OutOfDomain)
                }
            }
            (ValueDomain::MultiSelect(choices), Value::Array(items)) => {
                let mut picked = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(s) if choices.contains(&s) => picked.push(s),
                        _ => return Err(ValidationReason::OutOfDomain),
                    }
                }
                // Normalize to declaration order so output is stable
                Ok(AnswerValue::List(
                    choices
                        .iter()
                        .filter(|c| picked.contains(c))
                        .map(|c| c.to_string())
                        .collect(),
                ))
            }
            _ => Err(ValidationReason::OutOfDomain),
        }
    }
}

impl fmt::Debug for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueDomain::Text { .. } => f.write_str("Text"),
            ValueDomain::Choice(c) => f.debug_tuple("Choice").field(c).finish(),
            ValueDomain::MultiSelect(c) => f.debug_tuple("MultiSelect").field(c).finish(),
        }
    }
}

/// One prompt/answer field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Message shown by the prompt front-end
    pub message: &'static str,
    pub domain: ValueDomain,
    /// Pre-filled by the prompt front-end, never applied by validation
    pub default: Option<AnswerValue>,
    visible_when: Option<Predicate>,
}

impl FieldSpec {
    pub fn text(name: &'static str, message: &'static str, accepts: fn(&str) -> bool) -> Self {
        Self::new(name, message, ValueDomain::Text { accepts })
    }

    pub fn choice(
        name: &'static str,
        message: &'static str,
        choices: &'static [&'static str],
    ) -> Self {
        Self::new(name, message, ValueDomain::Choice(choices))
    }

    pub fn multi_select(
        name: &'static str,
        message: &'static str,
        choices: &'static [&'static str],
    ) -> Self {
        Self::new(name, message, ValueDomain::MultiSelect(choices))
    }

    fn new(name: &'static str, message: &'static str, domain: ValueDomain) -> Self {
        Self {
            name,
            message,
            domain,
            default: None,
            visible_when: None,
        }
    }

    pub fn with_default(mut self, value: &str) -> Self {
        self.default = Some(AnswerValue::Text(value.to_string()));
        self
    }

    /// Default a multi-select to every declared choice
    pub fn with_all_selected(mut self) -> Self {
        let all = self.domain.choices().iter().map(|c| c.to_string()).collect();
        self.default = Some(AnswerValue::List(all));
        self
    }

    pub fn visible_when(mut self, predicate: Predicate) -> Self {
        self.visible_when = Some(predicate);
        self
    }

    /// Evaluate the visibility predicate against earlier answers
    pub fn is_visible(&self, earlier: &Answers) -> bool {
        self.visible_when.map_or(true, |p| p(earlier))
    }
}

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Missing,
    OutOfDomain,
}

impl ValidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationReason::Missing => "missing",
            ValidationReason::OutOfDomain => "out_of_domain",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid answer for '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
}

/// Ordered field declarations
#[derive(Debug, Clone, Default)]
pub struct AnswerSchema {
    fields: Vec<FieldSpec>,
}

impl AnswerSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        debug_assert!(
            fields
                .iter()
                .enumerate()
                .all(|(i, f)| fields[..i].iter().all(|g| g.name != f.name)),
            "duplicate field name in answer schema"
        );
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate raw answers in declaration order
    ///
    /// Invisible fields are dropped even when `raw` carries a value for them;
    /// keys the schema does not declare are ignored.
    pub fn validate(&self, raw: &RawAnswers) -> Result<ValidatedAnswers, ValidationError> {
        let mut accepted = Answers::new();

        for field in &self.fields {
            if !field.is_visible(&accepted) {
                if raw.get(field.name).is_some() {
                    tracing::debug!(field = field.name, "Dropping answer for hidden field");
                }
                continue;
            }

            let value = raw
                .get(field.name)
                .ok_or(ValidationReason::Missing)
                .and_then(|v| field.domain.check(v))
                .map_err(|reason| ValidationError {
                    field: field.name.to_string(),
                    reason,
                })?;

            accepted.insert(field.name, value);
        }

        Ok(ValidatedAnswers::new(accepted))
    }
}

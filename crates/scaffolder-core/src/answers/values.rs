//! Answer records: the untyped input and the typed, validated output

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single typed answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            AnswerValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AnswerValue::List(items) => Some(items),
            AnswerValue::Text(_) => None,
        }
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            AnswerValue::Text(s) => Value::String(s.clone()),
            AnswerValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// A (possibly partial) set of typed answers, keyed by field name
///
/// Visibility predicates receive this while answers are still being
/// collected or validated, so they only ever see earlier fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Answers {
    values: BTreeMap<String, AnswerValue>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AnswerValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AnswerValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AnswerValue::as_text)
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(AnswerValue::as_list)
    }

    /// True when `name` is a single choice equal to `value`, or a
    /// multi-select that includes it
    pub fn selected(&self, name: &str, value: &str) -> bool {
        match self.get(name) {
            Some(AnswerValue::Text(s)) => s == value,
            Some(AnswerValue::List(items)) => items.iter().any(|i| i == value),
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert back into the untyped form the schema validates
    pub fn to_raw(&self) -> RawAnswers {
        let mut raw = RawAnswers::new();
        for (name, value) in &self.values {
            raw.insert(name.clone(), value.to_json());
        }
        raw
    }
}

/// Answers exactly as the prompt collaborator produced them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAnswers(Map<String, Value>);

impl RawAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object (e.g. an `--answers` file)
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawAnswers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = RawAnswers::new();
        for (k, v) in iter {
            raw.insert(k, v);
        }
        raw
    }
}

/// Answers that passed schema validation
///
/// Only [`AnswerSchema::validate`](super::AnswerSchema::validate) creates
/// these; every downstream stage reads them and none mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedAnswers(Answers);

impl ValidatedAnswers {
    pub(crate) fn new(answers: Answers) -> Self {
        Self(answers)
    }

    pub fn answers(&self) -> &Answers {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<&AnswerValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.0.text(name)
    }

    /// Selected items of a multi-select; empty when the field is absent
    pub fn list(&self, name: &str) -> &[String] {
        self.0.list(name).unwrap_or(&[])
    }

    pub fn selected(&self, name: &str, value: &str) -> bool {
        self.0.selected(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_answers_from_json() {
        let raw = RawAnswers::from_json_str(r#"{"styling": "UnoCSS", "unocss_presets": []}"#)
            .unwrap();
        assert_eq!(raw.get("styling"), Some(&json!("UnoCSS")));
        assert_eq!(raw.get("unocss_presets"), Some(&json!([])));
        assert!(raw.get("database").is_none());
    }

    #[test]
    fn test_selected_matches_text_and_lists() {
        let mut answers = Answers::new();
        answers.insert("styling", AnswerValue::Text("UnoCSS".into()));
        answers.insert(
            "unocss_presets",
            AnswerValue::List(vec!["@unocss/preset-icons".into()]),
        );

        assert!(answers.selected("styling", "UnoCSS"));
        assert!(!answers.selected("styling", "Tailwind"));
        assert!(answers.selected("unocss_presets", "@unocss/preset-icons"));
        assert!(!answers.selected("unocss_presets", "@unocss/reset"));
        assert!(!answers.selected("database", "SQLite"));
    }

    #[test]
    fn test_to_raw_keeps_shapes() {
        let mut answers = Answers::new();
        answers.insert("rpc", AnswerValue::Text("tRPC".into()));
        answers.insert("presets", AnswerValue::List(vec!["a".into(), "b".into()]));

        let raw = answers.to_raw();
        assert_eq!(raw.get("rpc"), Some(&json!("tRPC")));
        assert_eq!(raw.get("presets"), Some(&json!(["a", "b"])));
    }
}

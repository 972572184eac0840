use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectDebitError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("holiday source error: {message}")]
    HolidaySource {
        message: String,
    },

    #[error("case record error: {message}")]
    CaseRecord {
        message: String,
    },

    #[error("ledger error: {message}")]
    Ledger {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid state: current {current}, expected {expected}")]
    InvalidState {
        current: String,
        expected: String,
    },
}

impl DirectDebitError {
    /// validation errors carried by this error, if any
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            DirectDebitError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectDebitError>;

/// field-addressable validation errors, keyed by field then by failed rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, BTreeMap<String, String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// record a failed rule against a field
    pub fn add(&mut self, field: &str, rule: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .insert(rule.to_string(), String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// number of fields with at least one failed rule
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// check that a specific rule failed for a field
    pub fn has_rule(&self, field: &str, rule: &str) -> bool {
        self.0
            .get(field)
            .map(|rules| rules.contains_key(rule))
            .unwrap_or(false)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// turn into an error when non-empty
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DirectDebitError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|(field, rules)| {
                let rules: Vec<&str> = rules.keys().map(String::as_str).collect();
                format!("{} ({})", field, rules.join(", "))
            })
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

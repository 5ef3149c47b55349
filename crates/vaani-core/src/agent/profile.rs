//! User profile and the fields the assistant knows how to collect.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::replies;

static AGE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{1,3}").unwrap());
static INCOME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{3,}").unwrap());

/// First code points of the native digit blocks folded to ASCII.
const TELUGU_ZERO: u32 = 0x0C66;
const DEVANAGARI_ZERO: u32 = 0x0966;

/// Rewrite Telugu and Devanagari digits as ASCII and drop thousands
/// separators.
fn normalize_digits(utterance: &str) -> String {
    utterance
        .chars()
        .filter(|&c| c != ',')
        .map(|c| {
            let code = c as u32;
            [TELUGU_ZERO, DEVANAGARI_ZERO]
                .iter()
                .find(|&&zero| (zero..zero + 10).contains(&code))
                .and_then(|&zero| char::from_digit(code - zero, 10))
                .unwrap_or(c)
        })
        .collect()
}

/// A collected profile value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

/// Facts collected about the user. Unset fields are absent, never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile {
    fields: BTreeMap<String, FieldValue>,
}

impl Profile {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_integer(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_integer)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

/// Fields with a known prompt and extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Age,
    Income,
}

impl ProfileField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "age" => Some(ProfileField::Age),
            "income" => Some(ProfileField::Income),
            _ => None,
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            ProfileField::Age => replies::ASK_AGE,
            ProfileField::Income => replies::ASK_INCOME,
        }
    }

    /// Pull a typed value out of a free-text utterance.
    ///
    /// Age is the first run of one to three digits. Income is the first
    /// run of three or more digits once thousands separators are removed.
    /// Telugu and Devanagari numerals count as digits.
    pub fn extract(self, utterance: &str) -> Option<FieldValue> {
        let normalized = normalize_digits(utterance);
        let pattern = match self {
            ProfileField::Age => &AGE_PATTERN,
            ProfileField::Income => &INCOME_PATTERN,
        };
        pattern
            .find(&normalized)?
            .as_str()
            .parse::<i64>()
            .ok()
            .map(FieldValue::Integer)
    }
}

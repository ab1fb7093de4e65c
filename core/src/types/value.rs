use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multi-select sentinel meaning "nothing selected"
pub const NONE_SELECTED: &str = "none";

/// A single field value as entered on a form or loaded from a template
///
/// `Null` and an empty `Text` both mean "not entered"; a `Number(0.0)` is an
/// entered zero and is kept distinct from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Returns whether the value counts as "not entered"
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
            FieldValue::Number(n) => !n.is_finite(),
            FieldValue::Bool(_) => false,
        }
    }

    /// Reads the value as a finite number
    ///
    /// Text is parsed defensively: surrounding whitespace is ignored and a
    /// comma is accepted as decimal separator. Non-numeric text is logged
    /// and treated as missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Reads the value as trimmed, non-empty text
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            FieldValue::Number(n) if n.is_finite() => Some(format_number(*n)),
            FieldValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Reads the value as a list of selected codes
    ///
    /// A single text value is split on commas so that form layers which
    /// serialize multi-selects as "a,b" are accepted.
    pub fn as_list(&self) -> Vec<String> {
        let items: Vec<String> = match self {
            FieldValue::List(items) => items.clone(),
            FieldValue::Text(s) => s.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Reads the value as a yes/no flag
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "yes" | "true" | "1" | "y" => Some(true),
                "no" | "false" | "0" | "n" => Some(false),
                _ => None,
            },
            FieldValue::Number(n) if n.is_finite() => Some(*n != 0.0),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Parses a number from operator-entered text
///
/// Returns `None` for empty text silently and for invalid text with a warning.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => {
            warn!("Ignoring non-numeric value '{}'", trimmed);
            None
        }
    }
}

/// Formats an entered number without trailing zeros
pub fn format_number(n: f64) -> String {
    // adding 0.0 folds -0.0 into 0.0
    format!("{}", n + 0.0)
}

/// A derived numeric value rounded to the precision of its clinical quantity
///
/// The calculator that produces a quantity decides its precision; the stored
/// value is already rounded and `Display` prints exactly that many decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantity {
    pub value: f64,
    pub decimals: u8,
}

impl Quantity {
    /// Rounds `value` to `decimals` places; returns `None` for NaN or infinity
    pub fn new(value: f64, decimals: u8) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let factor = 10f64.powi(decimals as i32);
        let rounded = (value * factor).round() / factor + 0.0;
        Some(Self {
            value: rounded,
            decimals,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.decimals as usize, self.value)
    }
}

//! Single typed values

use serde::{Serialize, Serializer};

/// Tokens read as a missing value, on top of the empty cell.
const MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing_token(raw: &str) -> bool {
    raw.is_empty() || MISSING_TOKENS.contains(&raw)
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Missing | Cell::Text(_) => None,
        }
    }

    /// String form used as a grouping key. `None` for missing cells.
    pub fn label(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Int(v) => Some(v.to_string()),
            Cell::Float(v) => Some(format_float(*v)),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

// Keep a trailing ".0" on integral floats so 2.0 and 2 stay distinct labels.
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Missing => serializer.serialize_none(),
            Cell::Int(v) => serializer.serialize_i64(*v),
            // JSON has no NaN/inf
            Cell::Float(v) if !v.is_finite() => serializer.serialize_none(),
            Cell::Float(v) => serializer.serialize_f64(*v),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

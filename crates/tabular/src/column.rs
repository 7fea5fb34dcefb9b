use std::collections::BTreeMap;

use crate::{Cell, Result, TabularError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every cell is missing
    Empty,
    Int,
    Float,
    Text,
}

#[derive(Clone, Debug)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    cells: Vec<Cell>,
}

impl Column {
    /// Build a column from raw cells (`None` = missing), picking the
    /// narrowest kind every present value fits: int, then float, then text.
    /// `inf` and out-of-range literals such as `1e400` are not floats.
    pub(crate) fn infer(name: String, raw: Vec<Option<String>>) -> Self {
        let present = || raw.iter().flatten();

        let kind = if present().next().is_none() {
            ColumnKind::Empty
        } else if present().all(|v| v.trim().parse::<i64>().is_ok()) {
            ColumnKind::Int
        } else if present().all(|v| parse_finite(v).is_some()) {
            ColumnKind::Float
        } else {
            ColumnKind::Text
        };

        let cells = raw
            .into_iter()
            .map(|v| match (v, kind) {
                (None, _) => Cell::Missing,
                // parse() already succeeded above for these kinds
                (Some(v), ColumnKind::Int) => v.trim().parse().map(Cell::Int).unwrap_or(Cell::Missing),
                (Some(v), ColumnKind::Float) => parse_finite(&v).map(Cell::Float).unwrap_or(Cell::Missing),
                (Some(v), _) => Cell::Text(v),
            })
            .collect();

        Self { name, kind, cells }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn missing_count(&self) -> u64 {
        self.cells.iter().filter(|c| c.is_missing()).count() as u64
    }

    /// Arithmetic mean over the non-missing values.
    ///
    /// `Ok(None)` when there is nothing to average; an error when the
    /// column holds text.
    pub fn mean(&self) -> Result<Option<f64>> {
        if self.kind == ColumnKind::Text {
            return Err(TabularError::NotNumeric(self.name.clone()));
        }

        let (sum, count) = self
            .cells
            .iter()
            .filter_map(Cell::as_f64)
            .fold((0.0_f64, 0_u64), |(s, n), v| (s + v, n + 1));

        if count == 0 {
            return Ok(None);
        }
        Ok(Some(sum / count as f64))
    }

    /// Occurrences of each distinct non-missing value, keyed by its label.
    pub fn value_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for label in self.cells.iter().filter_map(Cell::label) {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

fn parse_finite(v: &str) -> Option<f64> {
    v.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

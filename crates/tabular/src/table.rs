use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{Cell, Column};

/// Column-major table with a header row.
#[derive(Clone, Debug)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// `raw[i]` holds the cells of column `names[i]`; every column must have
    /// the same length.
    pub(crate) fn from_raw(names: Vec<String>, raw: Vec<Vec<Option<String>>>) -> Self {
        let rows = raw.first().map_or(0, Vec::len);
        let columns = names
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| Column::infer(name, cells))
            .collect();
        Self { columns, rows }
    }

    /// Number of data rows (the header is not counted).
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.column(n).is_some())
    }

    /// First `n` rows as header-to-value records, in column order.
    pub fn head(&self, n: usize) -> Vec<Record> {
        (0..self.rows.min(n))
            .map(|row| Record {
                fields: self
                    .columns
                    .iter()
                    .map(|c| (c.name().to_owned(), c.cells()[row].clone()))
                    .collect(),
            })
            .collect()
    }
}

/// One row keyed by column name. Serializes as a JSON object that keeps
/// the header order.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    fields: Vec<(String, Cell)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

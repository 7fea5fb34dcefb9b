//! Parsing raw bytes into a [`Table`]

use crate::{is_missing_token, Result, TabularError, Table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Source of tables: given raw delimited bytes, produce a typed table.
pub trait TableReader: Send + Sync {
    fn read(&self, bytes: &[u8]) -> Result<Table>;
}

#[derive(Clone, Debug)]
pub struct CsvReader {
    delimiter: u8,
}

impl CsvReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TableReader for CsvReader {
    fn read(&self, bytes: &[u8]) -> Result<Table> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            // short rows are padded below, long rows rejected
            .flexible(true)
            .from_reader(bytes);

        let headers = rdr.headers()?.clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(TabularError::Empty);
        }
        let names = dedupe_headers(headers.iter());
        let width = names.len();

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() > width {
                return Err(TabularError::RaggedRow {
                    row: i + 1,
                    expected: width,
                    found: record.len(),
                });
            }
            for (j, column) in raw.iter_mut().enumerate() {
                let value = record
                    .get(j)
                    .filter(|v| !is_missing_token(v))
                    .map(str::to_owned);
                column.push(value);
            }
        }

        Ok(Table::from_raw(names, raw))
    }
}

/// Repeated header labels get a `.1`, `.2`, ... suffix so every column
/// stays addressable.
fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for h in headers {
        let mut name = h.to_owned();
        let mut n = 0;
        while out.contains(&name) {
            n += 1;
            name = format!("{h}.{n}");
        }
        out.push(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_repeated_headers() {
        let names = dedupe_headers(["a", "b", "a", "a"].into_iter());
        assert_eq!(names, vec!["a", "b", "a.1", "a.2"]);
    }

    #[test]
    fn strips_bom() {
        let table = CsvReader::new().read(b"\xEF\xBB\xBFName,Value\nx,1\n").unwrap();
        assert!(table.column("Name").is_some());
    }
}

//! Numeric tables feeding the data-driven templates.
//!
//! Tables load from CSV (header row required) or JSON in one of four shapes: an array of
//! objects, an array of arrays, an array of numbers, or an object of equal-length arrays.
//! Object key order is kept, so the first key is the first column.

use crate::cache::key::sha256_hex;
use crate::foundation::error::{ManimlineError, ManimlineResult};
use anyhow::Context as _;
use serde::de::{Deserializer, MapAccess, Visitor};
use std::fmt::{self, Write as _};
use std::path::Path;

/// Rows past this count are thinned evenly before being written into generated code.
pub const MAX_EMBEDDED_ROWS: usize = 500;

/// Column-named numeric table. Every cell is finite and every row has one value per column.
#[derive(Clone, Debug, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl DataTable {
    /// Table from named columns and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> ManimlineResult<Self> {
        if columns.is_empty() {
            return Err(ManimlineError::malformed("data has no columns"));
        }
        for (i, c) in columns.iter().enumerate() {
            if c.trim().is_empty() {
                return Err(ManimlineError::malformed(format!("data column {} has no name", i + 1)));
            }
            if columns[..i].contains(c) {
                return Err(ManimlineError::malformed(format!("duplicate data column '{c}'")));
            }
        }
        if rows.is_empty() {
            return Err(ManimlineError::malformed("data has no rows"));
        }
        for (r, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ManimlineError::malformed(format!(
                    "data row {} has {} values, expected {}",
                    r + 1,
                    row.len(),
                    columns.len()
                )));
            }
            if let Some((c, v)) = row.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(ManimlineError::malformed(format!(
                    "data row {}, column '{}': {v} is not finite",
                    r + 1,
                    columns[c]
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Parse CSV with a header row. Cells are trimmed and must be numbers.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> ManimlineResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| ManimlineError::malformed(format!("CSV header: {e}")))?
            .iter()
            .map(str::to_owned)
            .collect();

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| ManimlineError::malformed(format!("CSV: {e}")))?;
            let mut row = Vec::with_capacity(record.len());
            for (c, cell) in record.iter().enumerate() {
                let v = parse_number(cell).ok_or_else(|| {
                    ManimlineError::malformed(format!(
                        "data row {}, column '{}': '{cell}' is not a number",
                        i + 1,
                        columns.get(c).map_or("?", String::as_str)
                    ))
                })?;
                row.push(v);
            }
            rows.push(row);
        }
        Self::new(columns, rows)
    }

    /// Parse a JSON table document.
    pub fn from_json_str(json: &str) -> ManimlineResult<Self> {
        let doc: JsonTable = serde_json::from_str(json)
            .map_err(|e| ManimlineError::malformed(format!("data JSON is not a table: {e}")))?;
        match doc {
            JsonTable::Records(records) => {
                let columns: Vec<String> = records
                    .first()
                    .map(|r| r.0.iter().map(|(k, _)| k.clone()).collect())
                    .unwrap_or_default();
                let mut rows = Vec::with_capacity(records.len());
                for (i, record) in records.iter().enumerate() {
                    let row = columns
                        .iter()
                        .map(|c| {
                            record.get(c).and_then(json_number).ok_or_else(|| {
                                ManimlineError::malformed(format!(
                                    "data row {}, column '{c}': missing or not a number",
                                    i + 1
                                ))
                            })
                        })
                        .collect::<ManimlineResult<Vec<f64>>>()?;
                    rows.push(row);
                }
                Self::new(columns, rows)
            }
            JsonTable::Rows(raw) => {
                let width = raw.first().map_or(0, Vec::len);
                let columns = (0..width).map(|i| format!("col_{i}")).collect();
                let rows = raw
                    .iter()
                    .enumerate()
                    .map(|(i, row)| numbers(row, || format!("data row {}", i + 1)))
                    .collect::<ManimlineResult<Vec<_>>>()?;
                Self::new(columns, rows)
            }
            JsonTable::Values(values) => {
                let column = numbers(&values, || "data values".to_owned())?;
                Self::new(vec!["value".to_owned()], column.into_iter().map(|v| vec![v]).collect())
            }
            JsonTable::Columns(record) => {
                let mut columns = Vec::with_capacity(record.0.len());
                let mut data = Vec::with_capacity(record.0.len());
                for (name, value) in &record.0 {
                    let serde_json::Value::Array(items) = value else {
                        return Err(ManimlineError::malformed(format!(
                            "data column '{name}' is not an array"
                        )));
                    };
                    data.push(numbers(items, || format!("data column '{name}'"))?);
                    columns.push(name.clone());
                }
                let len = data.first().map_or(0, Vec::len);
                if let Some((name, col)) = columns.iter().zip(&data).find(|(_, c)| c.len() != len) {
                    return Err(ManimlineError::malformed(format!(
                        "data column '{name}' has {} values, expected {len}",
                        col.len()
                    )));
                }
                let rows = (0..len).map(|r| data.iter().map(|c| c[r]).collect()).collect();
                Self::new(columns, rows)
            }
        }
    }

    /// Load a `.csv` or `.json` file.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> ManimlineResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parsed = match ext.as_deref() {
            Some("csv") => {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("failed to open data file '{}'", path.display()))?;
                Self::from_csv_reader(file)
            }
            Some("json") => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read data file '{}'", path.display()))?;
                Self::from_json_str(&json)
            }
            _ => {
                return Err(ManimlineError::malformed(format!(
                    "unsupported data file '{}'; expected .csv or .json",
                    path.display()
                )));
            }
        };
        let table = parsed.map_err(|e| match e {
            ManimlineError::MalformedInput(m) => {
                ManimlineError::malformed(format!("{}: {m}", path.display()))
            }
            other => other,
        })?;
        tracing::debug!(rows = table.len(), columns = table.width(), "loaded data table");
        Ok(table)
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in file order, one value per column.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false` for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Values of the named column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let i = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[i]).collect())
    }

    /// At most `max` rows, evenly spaced and keeping the first and last.
    pub fn sample(&self, max: usize) -> Vec<&[f64]> {
        let n = self.rows.len();
        if n <= max {
            return self.rows.iter().map(Vec::as_slice).collect();
        }
        if max < 2 {
            return self.rows.iter().take(max).map(Vec::as_slice).collect();
        }
        (0..max)
            .map(|i| self.rows[i * (n - 1) / (max - 1)].as_slice())
            .collect()
    }

    /// Content hash over column names and cell values.
    pub fn digest(&self) -> String {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.columns.len() as u64).to_le_bytes());
        for c in &self.columns {
            buf.extend_from_slice(&(c.len() as u64).to_le_bytes());
            buf.extend_from_slice(c.as_bytes());
        }
        for v in self.rows.iter().flatten() {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        sha256_hex(&buf)
    }

    /// Short CSV excerpt for prompts: a summary line, the header and the first `rows` rows.
    pub fn preview(&self, rows: usize) -> String {
        let mut out = format!("{} rows, columns: {}\n", self.len(), self.columns.join(", "));
        out.push_str(&self.columns.join(","));
        for row in self.rows.iter().take(rows) {
            out.push('\n');
            let cells: Vec<String> = row.iter().map(f64::to_string).collect();
            out.push_str(&cells.join(","));
        }
        if self.len() > rows {
            let _ = write!(out, "\n... ({} more)", self.len() - rows);
        }
        out
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn json_number(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn numbers(
    values: &[serde_json::Value],
    what: impl Fn() -> String,
) -> ManimlineResult<Vec<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json_number(v).ok_or_else(|| {
                ManimlineError::malformed(format!("{}, item {}: not a number", what(), i + 1))
            })
        })
        .collect()
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum JsonTable {
    Records(Vec<Record>),
    Rows(Vec<Vec<serde_json::Value>>),
    Values(Vec<serde_json::Value>),
    Columns(Record),
}

/// JSON object with its keys in document order.
struct Record(Vec<(String, serde_json::Value)>);

impl Record {
    fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<'de> serde::Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
                let mut fields = Vec::new();
                while let Some((k, v)) = map.next_entry::<String, serde_json::Value>()? {
                    fields.push((k, v));
                }
                Ok(Record(fields))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codegen/data.rs"]
mod tests;

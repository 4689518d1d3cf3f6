//! Tabular input: a CSV file with a header row.
//!
//! One designated column (or set of columns) supplies per-sample labels,
//! another supplies molecule descriptors (e.g. SMILES strings) handed to
//! the chemistry collaborator. Cells are kept as raw strings; numeric
//! interpretation happens at label extraction.

use std::io::Read;
use std::path::Path;

use ndarray::Array2;

use crate::error::{DataError, Result};

/// Which table columns supply the per-sample graph labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSpec {
    /// A single column by header name.
    Column(String),
    /// Several columns by header name, concatenated in order.
    Columns(Vec<String>),
    /// Several columns by position.
    Positions(Vec<usize>),
    /// A contiguous column range `[start, end)`.
    Range(usize, usize),
}

/// An in-memory table: header plus raw string rows.
#[derive(Debug, Clone)]
pub struct TableFile {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableFile {
    /// Read a CSV file with a header row.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read CSV from any reader (handy for tests and in-memory data).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    /// Header names, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn header_position(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// All cells of a named column as raw strings.
    pub fn column(&self, name: &str) -> Result<Vec<String>> {
        let pos = self.header_position(name)?;
        self.rows
            .iter()
            .map(|row| {
                row.get(pos)
                    .cloned()
                    .ok_or(DataError::BadColumnIndex(pos))
            })
            .collect()
    }

    fn numeric_column(&self, pos: usize) -> Result<Vec<f32>> {
        if pos >= self.headers.len() {
            return Err(DataError::BadColumnIndex(pos));
        }
        let column = &self.headers[pos];
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let value = cells.get(pos).ok_or(DataError::BadColumnIndex(pos))?;
                value.trim().parse::<f32>().map_err(|_| DataError::BadNumber {
                    column: column.clone(),
                    row,
                    value: value.clone(),
                })
            })
            .collect()
    }

    /// Extract graph labels as an `(n_samples, n_targets)` float array.
    ///
    /// A single column expands to one target column.
    pub fn labels(&self, spec: &LabelSpec) -> Result<Array2<f32>> {
        if self.rows.is_empty() {
            return Err(DataError::EmptyTable);
        }
        let positions: Vec<usize> = match spec {
            LabelSpec::Column(name) => vec![self.header_position(name)?],
            LabelSpec::Columns(names) => names
                .iter()
                .map(|n| self.header_position(n))
                .collect::<Result<_>>()?,
            LabelSpec::Positions(positions) => positions.clone(),
            LabelSpec::Range(start, end) => (*start..*end).collect(),
        };
        if positions.is_empty() {
            return Err(DataError::BadColumnIndex(0));
        }

        let columns: Vec<Vec<f32>> = positions
            .iter()
            .map(|&p| self.numeric_column(p))
            .collect::<Result<_>>()?;

        let mut out = Array2::<f32>::zeros((self.rows.len(), positions.len()));
        for (c, column) in columns.iter().enumerate() {
            for (r, &v) in column.iter().enumerate() {
                out[[r, c]] = v;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CSV: &str = "smiles,logS,logP\nCCO,-0.77,0.07\nC,1.0,0.6\nCC,0.5,0.2\n";

    #[test]
    fn reads_headers_and_rows() {
        let t = TableFile::from_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(t.headers(), &["smiles", "logS", "logP"]);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn column_by_name() {
        let t = TableFile::from_reader(Cursor::new(CSV)).unwrap();
        let smiles = t.column("smiles").unwrap();
        assert_eq!(smiles, vec!["CCO", "C", "CC"]);
        assert!(matches!(
            t.column("inchi").unwrap_err(),
            DataError::MissingColumn(_)
        ));
    }

    #[test]
    fn single_label_column_expands_to_one_target() {
        let t = TableFile::from_reader(Cursor::new(CSV)).unwrap();
        let labels = t.labels(&LabelSpec::Column("logS".to_string())).unwrap();
        assert_eq!(labels.shape(), &[3, 1]);
        assert!((labels[[0, 0]] + 0.77).abs() < 1e-6);
    }

    #[test]
    fn multi_column_labels_concatenate_in_order() {
        let t = TableFile::from_reader(Cursor::new(CSV)).unwrap();
        let labels = t
            .labels(&LabelSpec::Columns(vec!["logS".into(), "logP".into()]))
            .unwrap();
        assert_eq!(labels.shape(), &[3, 2]);
        assert!((labels[[1, 1]] - 0.6).abs() < 1e-6);

        let by_range = t.labels(&LabelSpec::Range(1, 3)).unwrap();
        assert_eq!(labels, by_range);
    }

    #[test]
    fn bad_cells_name_column_and_row() {
        let t = TableFile::from_reader(Cursor::new("smiles,y\nCCO,oops\n")).unwrap();
        let err = t.labels(&LabelSpec::Column("y".to_string())).unwrap_err();
        assert!(matches!(err, DataError::BadNumber { row: 0, .. }));
    }

    #[test]
    fn out_of_range_position_fails() {
        let t = TableFile::from_reader(Cursor::new(CSV)).unwrap();
        assert!(matches!(
            t.labels(&LabelSpec::Positions(vec![9])).unwrap_err(),
            DataError::BadColumnIndex(9)
        ));
    }
}

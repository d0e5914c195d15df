//! Table: row-keyed container of named numeric series

use crate::error::{PrepError, PrepResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a table row
///
/// Integer keys are what a table gets when it is built without explicit
/// keys; label keys usually encode `<label>_<index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    Index(i64),
    Label(String),
}

impl RowKey {
    /// Integer value of the key, if it is an index key
    pub fn as_index(&self) -> Option<i64> {
        match self {
            RowKey::Index(i) => Some(*i),
            RowKey::Label(_) => None,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Index(i) => write!(f, "{i}"),
            RowKey::Label(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RowKey {
    fn from(value: i64) -> Self {
        RowKey::Index(value)
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        RowKey::Label(value.to_string())
    }
}

impl From<String> for RowKey {
    fn from(value: String) -> Self {
        RowKey::Label(value)
    }
}

/// One named series, aligned to the table's row keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered rows identified by [`RowKey`], ordered uniquely-named columns
///
/// Every column holds exactly one value per row key. Construction goes
/// through [`Table::new`] or [`Table::push_column`], both of which enforce
/// that and reject duplicate names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    row_keys: Vec<RowKey>,
    columns: Vec<Column>,
}

impl Table {
    /// Create a table from row keys and columns, validating alignment
    pub fn new(row_keys: Vec<RowKey>, columns: Vec<Column>) -> PrepResult<Self> {
        let mut table = Table::with_row_keys(row_keys);
        for column in columns {
            table.push_column(column.name, column.values)?;
        }
        Ok(table)
    }

    /// Create a table with a `0..n` integer index
    pub fn from_columns(columns: Vec<Column>) -> PrepResult<Self> {
        let n_rows = columns.first().map_or(0, Column::len);
        let row_keys = (0..n_rows as i64).map(RowKey::Index).collect();
        Table::new(row_keys, columns)
    }

    /// Create a table with rows but no columns yet
    pub fn with_row_keys(row_keys: Vec<RowKey>) -> Self {
        Table {
            row_keys,
            columns: Vec::new(),
        }
    }

    /// Append a column; its length must match the row count
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> PrepResult<()> {
        let name = name.into();
        if values.len() != self.row_keys.len() {
            return Err(PrepError::ShapeMismatch {
                column: name,
                expected: self.row_keys.len(),
                actual: values.len(),
            });
        }
        if self.columns.iter().any(|c| c.name == name) {
            return Err(PrepError::DuplicateColumn { name });
        }

        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.row_keys.len()
    }

    /// Number of columns
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows or no columns
    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty() || self.columns.is_empty()
    }

    pub fn row_keys(&self) -> &[RowKey] {
        &self.row_keys
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Values of the named column
    pub fn column(&self, name: &str) -> PrepResult<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| PrepError::UnknownColumn {
                name: name.to_string(),
            })
    }

    /// Smallest integer row key, `None` if any key is a label or the table has no rows
    pub fn min_row_index(&self) -> Option<i64> {
        self.row_keys
            .iter()
            .map(RowKey::as_index)
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .min()
    }

    /// Keep the rows at the given positions, in the given order
    pub fn select_rows(&self, positions: &[usize]) -> PrepResult<Table> {
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.n_rows()) {
            return Err(PrepError::InvalidParameter {
                parameter: "positions",
                reason: format!("row position {} out of bounds (0-{})", bad, self.n_rows()),
            });
        }

        let row_keys = positions.iter().map(|&p| self.row_keys[p].clone()).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: positions.iter().map(|&p| c.values[p]).collect(),
            })
            .collect();

        Ok(Table { row_keys, columns })
    }

    /// Keep the rows where `mask` is true
    pub fn filter_rows(&self, mask: &[bool]) -> PrepResult<Table> {
        if mask.len() != self.n_rows() {
            return Err(PrepError::ShapeMismatch {
                column: "mask".to_string(),
                expected: self.n_rows(),
                actual: mask.len(),
            });
        }

        let positions: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();

        self.select_rows(&positions)
    }

    /// Build a table with the same row keys whose columns are derived one-to-one
    /// from this table's, named `<name><suffix>`
    pub fn map_columns<F>(&self, suffix: &str, mut f: F) -> PrepResult<Table>
    where
        F: FnMut(&Column) -> PrepResult<Vec<f64>>,
    {
        let mut output = Table::with_row_keys(self.row_keys.clone());
        for column in &self.columns {
            let values = f(column)?;
            output.push_column(format!("{}{}", column.name, suffix), values)?;
        }
        Ok(output)
    }
}

#[derive(Deserialize)]
struct RawTable {
    row_keys: Vec<RowKey>,
    columns: Vec<Column>,
}

// Deserialized tables go through the same validation as `Table::new`.
impl<'de> Deserialize<'de> for Table {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawTable::deserialize(deserializer)?;
        Table::new(raw.row_keys, raw.columns).map_err(serde::de::Error::custom)
    }
}

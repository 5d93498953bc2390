// src/data_types.rs
use serde_json::Value;

/// Rows of a worksheet keyed by the header row.
///
/// `headers` keeps the order of the first row; each entry of `rows` holds one
/// cell per header, in the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn empty() -> Self {
        Table {
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from a raw value grid where the first row holds the headers.
    pub fn from_grid(values: Vec<Vec<Value>>) -> Self {
        let mut grid = values.into_iter();
        let headers: Vec<String> = match grid.next() {
            Some(first) => first.iter().map(Self::cell_text).collect(),
            None => return Table::empty(),
        };

        let width = headers.len();
        let rows = grid
            .filter(|row| !row.iter().all(Self::is_blank))
            .map(|mut row| {
                // The API drops trailing empty cells.
                row.resize(width, Value::Null);
                row
            })
            .collect();

        Table { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.headers.iter().position(|h| h == column)?;
        self.rows.get(row)?.get(index)
    }

    pub fn cell_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn is_blank(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

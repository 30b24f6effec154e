//! Example tables and the per-scenario example cursor.

use crate::errors::ExampleOutOfRangeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// An immutable table of named-column rows parametrizing a scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplesTable {
    /// Column names in declaration order.
    #[serde(default)]
    headers: Vec<String>,
    /// Rows keyed by column name.
    #[serde(default)]
    rows: Vec<HashMap<String, String>>,
}

impl ExamplesTable {
    /// Creates a table with no columns and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a table from headers and positional row values.
    ///
    /// Values beyond the header count are ignored; missing values become
    /// empty strings.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|values| {
                let mut values = values.into_iter();
                headers
                    .iter()
                    .map(|header| (header.clone(), values.next().unwrap_or_default()))
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }

    /// Creates a table from keyed rows. Headers are taken from the first row,
    /// sorted by name.
    #[must_use]
    pub fn from_rows(rows: Vec<HashMap<String, String>>) -> Self {
        let mut headers: Vec<String> = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        headers.sort();
        Self { headers, rows }
    }

    /// Returns the column names.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ExampleOutOfRangeError` if `index` is negative or past the
    /// last row.
    pub fn row(&self, index: i64) -> Result<HashMap<String, String>, ExampleOutOfRangeError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.rows.get(i))
            .cloned()
            .ok_or_else(|| ExampleOutOfRangeError::new(index, self.rows.len()))
    }
}

/// The example table of the running scenario, the step templates it
/// parametrizes, and a cursor on the row currently executing.
///
/// The cursor starts at -1, meaning no row has been selected yet.
#[derive(Debug)]
pub struct ExampleSet {
    table: ExamplesTable,
    steps: Vec<String>,
    current_example: AtomicI64,
}

impl ExampleSet {
    /// Creates an example set with no row selected.
    #[must_use]
    pub fn new(steps: Vec<String>, table: ExamplesTable) -> Self {
        Self {
            table,
            steps,
            current_example: AtomicI64::new(-1),
        }
    }

    /// Returns the example table.
    #[must_use]
    pub fn table(&self) -> &ExamplesTable {
        &self.table
    }

    /// Returns the step templates.
    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Returns true if `step` is one of the parametrized templates.
    #[must_use]
    pub fn has_step(&self, step: &str) -> bool {
        self.steps.iter().any(|s| s == step)
    }

    /// Returns the selected row index, or -1 if none.
    #[must_use]
    pub fn current_example(&self) -> i64 {
        self.current_example.load(Ordering::SeqCst)
    }

    /// Selects the row that is about to run.
    pub fn set_current_example(&self, index: i64) {
        self.current_example.store(index, Ordering::SeqCst);
    }

    /// Returns the parameters of the selected row.
    ///
    /// # Errors
    ///
    /// Returns `ExampleOutOfRangeError` if no valid row is selected.
    pub fn current_example_params(&self) -> Result<HashMap<String, String>, ExampleOutOfRangeError> {
        self.table.row(self.current_example())
    }
}

impl Clone for ExampleSet {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            steps: self.steps.clone(),
            current_example: AtomicI64::new(self.current_example()),
        }
    }
}

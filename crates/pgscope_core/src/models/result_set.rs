//! Tabular query results with a row cursor.

/// An owned tabular result.
///
/// Values arrive in text form. Missing columns and NULL cells read as empty
/// strings through [`value`](Self::value); use [`is_null`](Self::is_null) to
/// tell them apart. Dropping the set releases it.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    position: usize,
    quote_columns: bool,
}

impl ResultSet {
    /// Create a result set positioned on its first row.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows, position: 0, quote_columns: false }
    }

    /// Also match columns the server returned under their quoted spelling.
    pub fn with_column_quoting(mut self, quote_columns: bool) -> Self {
        self.quote_columns = quote_columns;
        self
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    /// Check if the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column name by index.
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Column index by name.
    pub fn column_number(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| {
            col == name
                || (self.quote_columns
                    && col.len() == name.len() + 2
                    && col.starts_with('"')
                    && col.ends_with('"')
                    && &col[1..col.len() - 1] == name)
        })
    }

    // ========== Cursor ==========

    /// True once the cursor has moved past the last row.
    pub fn eof(&self) -> bool {
        self.position >= self.rows.len()
    }

    /// Advance to the next row.
    pub fn move_next(&mut self) {
        if !self.eof() {
            self.position += 1;
        }
    }

    /// Rewind to the first row.
    pub fn move_first(&mut self) {
        self.position = 0;
    }

    fn cell(&self, index: usize) -> Option<&str> {
        self.rows.get(self.position)?.get(index)?.as_deref()
    }

    // ========== Values on the current row ==========

    /// Text value of a column by index.
    pub fn value_at(&self, index: usize) -> &str {
        self.cell(index).unwrap_or_default()
    }

    /// Text value of a column by name.
    pub fn value(&self, name: &str) -> &str {
        self.column_number(name).map(|i| self.value_at(i)).unwrap_or_default()
    }

    /// Whether the named column is NULL (or absent) on the current row.
    pub fn is_null(&self, name: &str) -> bool {
        self.column_number(name).and_then(|i| self.cell(i)).is_none()
    }

    /// Integer value; 0 when NULL or not numeric.
    pub fn long(&self, name: &str) -> i64 {
        self.value(name).trim().parse().unwrap_or(0)
    }

    /// Object id value; 0 when NULL or not an oid.
    pub fn oid(&self, name: &str) -> u32 {
        self.value(name).trim().parse().unwrap_or(0)
    }

    /// Floating point value; 0.0 when NULL or not numeric.
    pub fn double(&self, name: &str) -> f64 {
        self.value(name).trim().parse().unwrap_or(0.0)
    }

    /// Boolean value in PostgreSQL text form.
    pub fn bool(&self, name: &str) -> bool {
        str_to_bool(self.value(name))
    }
}

/// Interpret a PostgreSQL boolean rendered as text (`t`, `true`, `yes`, `1`).
pub fn str_to_bool(value: &str) -> bool {
    matches!(value.chars().next(), Some('t' | 'T' | 'y' | 'Y' | '1'))
}

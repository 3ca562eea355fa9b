use crate::error::{DriverError, Result};

/// One text cell. A cell that was never written, or was written as NULL,
/// has empty text and the null flag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: Vec<u8>,
    null: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            text: Vec::new(),
            null: true,
        }
    }
}

impl Cell {
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn is_null(&self) -> bool {
        self.null
    }

    /// The cell bytes, or `None` for NULL.
    pub fn value(&self) -> Option<&[u8]> {
        if self.null {
            None
        } else {
            Some(&self.text)
        }
    }

    fn from_value(value: Option<Vec<u8>>) -> Self {
        match value {
            Some(text) => Self { text, null: false },
            None => Self::default(),
        }
    }
}

/// Read-only view of one row's cells.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    cells: &'a [Cell],
}

impl<'a> RowView<'a> {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `None` when `col` is out of range; `Some(None)` for a NULL cell.
    pub fn get(&self, col: usize) -> Option<Option<&'a [u8]>> {
        let cells: &'a [Cell] = self.cells;
        cells.get(col).map(Cell::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&'a [u8]>> + 'a {
        let cells: &'a [Cell] = self.cells;
        cells.iter().map(Cell::value)
    }

    pub fn to_owned_values(&self) -> Vec<Option<Vec<u8>>> {
        self.iter().map(|v| v.map(<[u8]>::to_vec)).collect()
    }
}

/// Row-major grid of text cells holding a materialised result set.
///
/// `rows * cols == cells.len()` and `ids.len() == rows` hold after every
/// operation. Every row gets an id when it is created; ids only grow and are
/// never handed out twice until the store is cleared, so `ids` stays sorted.
#[derive(Debug, Clone, Default)]
pub struct CellStore {
    cells: Vec<Cell>,
    rows: usize,
    cols: usize,
    ids: Vec<u64>,
    next_id: u64,
    /// Row the producer is currently filling, if population has started.
    write_row: Option<usize>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(cols: usize) -> Self {
        Self {
            cols,
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn write_row(&self) -> Option<usize> {
        self.write_row
    }

    /// Reallocates to `rows x cols`, keeping every cell whose coordinates are
    /// still in range. Either dimension being zero clears the store.
    pub fn resize(&mut self, rows: usize, cols: usize) -> usize {
        if rows == 0 || cols == 0 {
            self.clear();
            return 0;
        }

        let mut cells = vec![Cell::default(); rows * cols];
        for r in 0..self.rows.min(rows) {
            for c in 0..self.cols.min(cols) {
                cells[r * cols + c] = std::mem::take(&mut self.cells[r * self.cols + c]);
            }
        }
        self.cells = cells;
        self.ids.truncate(rows);
        while self.ids.len() < rows {
            self.push_id();
        }
        self.rows = rows;
        self.cols = cols;
        self.clamp_write_row();
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.rows = 0;
        self.cols = 0;
        self.ids.clear();
        self.next_id = 0;
        self.write_row = None;
    }

    fn push_id(&mut self) {
        self.ids.push(self.next_id);
        self.next_id += 1;
    }

    /// Stable id of the row currently at index `row`.
    pub fn row_id(&self, row: usize) -> Option<u64> {
        self.ids.get(row).copied()
    }

    /// Current index of the row with id `id`; `None` once it was removed.
    pub fn find_row(&self, id: u64) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(DriverError::OutOfRange(format!(
                "Cell ({}, {}) outside {}x{} result",
                row, col, self.rows, self.cols
            )));
        }
        Ok(row * self.cols + col)
    }

    pub fn write(&mut self, row: usize, col: usize, text: &[u8]) -> Result<()> {
        let i = self.index(row, col)?;
        let cell = &mut self.cells[i];
        cell.text.clear();
        cell.text.extend_from_slice(text);
        cell.null = false;
        Ok(())
    }

    pub fn write_null(&mut self, row: usize, col: usize) -> Result<()> {
        let i = self.index(row, col)?;
        self.cells[i] = Cell::default();
        Ok(())
    }

    /// Cell text and its null flag.
    pub fn read(&self, row: usize, col: usize) -> Result<(&[u8], bool)> {
        let cell = &self.cells[self.index(row, col)?];
        Ok((cell.text.as_slice(), cell.null))
    }

    /// Cell bytes, `None` for NULL.
    pub fn value(&self, row: usize, col: usize) -> Result<Option<&[u8]>> {
        Ok(self.cells[self.index(row, col)?].value())
    }

    /// Moves the producer to the next row, growing the store by exactly one
    /// row when it is already full. Returns whether the store grew.
    pub fn advance_row(&mut self) -> bool {
        let next = self.write_row.map_or(0, |r| r + 1);
        self.write_row = Some(next);
        if next < self.rows {
            return false;
        }
        self.cells
            .extend(std::iter::repeat_with(Cell::default).take(self.cols));
        self.push_id();
        self.rows += 1;
        true
    }

    fn active_row(&self) -> Result<usize> {
        self.write_row
            .ok_or_else(|| DriverError::OutOfRange("No active row to write".to_string()))
    }

    pub fn write_current(&mut self, col: usize, text: &[u8]) -> Result<()> {
        let row = self.active_row()?;
        self.write(row, col, text)
    }

    pub fn write_current_null(&mut self, col: usize) -> Result<()> {
        let row = self.active_row()?;
        self.write_null(row, col)
    }

    pub fn row(&self, row: usize) -> Option<RowView<'_>> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        Some(RowView {
            cells: &self.cells[start..start + self.cols],
        })
    }

    fn check_width(&self, values: &[Option<Vec<u8>>]) -> Result<()> {
        if values.len() != self.cols {
            return Err(DriverError::InvalidArgument(format!(
                "Row has {} cells, result has {} columns",
                values.len(),
                self.cols
            )));
        }
        Ok(())
    }

    pub fn append_row(&mut self, values: Vec<Option<Vec<u8>>>) -> Result<usize> {
        self.check_width(&values)?;
        self.cells.extend(values.into_iter().map(Cell::from_value));
        self.push_id();
        self.rows += 1;
        Ok(self.rows - 1)
    }

    pub fn replace_row(&mut self, row: usize, values: Vec<Option<Vec<u8>>>) -> Result<()> {
        self.check_width(&values)?;
        if row >= self.rows {
            return Err(DriverError::OutOfRange(format!(
                "Row {} outside result of {} rows",
                row, self.rows
            )));
        }
        let start = row * self.cols;
        for (slot, value) in self.cells[start..start + self.cols].iter_mut().zip(values) {
            *slot = Cell::from_value(value);
        }
        Ok(())
    }

    /// Removes a row; later rows shift up by one and keep their ids.
    pub fn remove_row(&mut self, row: usize) -> Result<()> {
        if row >= self.rows {
            return Err(DriverError::OutOfRange(format!(
                "Row {} outside result of {} rows",
                row, self.rows
            )));
        }
        let start = row * self.cols;
        self.cells.drain(start..start + self.cols);
        self.ids.remove(row);
        self.rows -= 1;
        self.clamp_write_row();
        Ok(())
    }

    fn clamp_write_row(&mut self) {
        self.write_row = match (self.write_row, self.rows) {
            (_, 0) => None,
            (Some(r), rows) => Some(r.min(rows - 1)),
            (None, _) => None,
        };
    }
}

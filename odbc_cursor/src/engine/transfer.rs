use crate::error::{DriverError, Result};

/// Where a `get_data` call for a column starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// First call for this column on this row.
    Fresh,
    /// Continuation of an oversized value; `offset` source bytes already went out.
    Resumed { offset: usize },
    /// Everything was delivered by earlier calls.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveColumn {
    row: usize,
    column: usize,
    offset: usize,
    pending: Option<u16>,
    exhausted: bool,
}

/// Progress of a value that is being drained over several `get_data` calls.
///
/// Only one column is tracked: switching to another column silently drops
/// whatever was left of the previous one.
#[derive(Debug, Default, Clone)]
pub struct ChunkedTransfer {
    active: Option<ActiveColumn>,
}

impl ChunkedTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_column(&mut self, row: usize, column: usize) -> Result<Progress> {
        match self.active {
            Some(a) if a.column == column && a.row != row => {
                self.active = None;
                Err(DriverError::InvalidSequence(format!(
                    "column {} was in progress on row {}, cursor is now on row {}",
                    column, a.row, row
                )))
            }
            Some(a) if a.column == column => {
                if a.exhausted {
                    Ok(Progress::Exhausted)
                } else {
                    Ok(Progress::Resumed { offset: a.offset })
                }
            }
            _ => {
                self.active = Some(ActiveColumn {
                    row,
                    column,
                    offset: 0,
                    pending: None,
                    exhausted: false,
                });
                Ok(Progress::Fresh)
            }
        }
    }

    pub fn column(&self) -> Option<usize> {
        self.active.map(|a| a.column)
    }

    pub fn offset(&self) -> usize {
        self.active.map_or(0, |a| a.offset)
    }

    pub fn advance(&mut self, consumed: usize) {
        if let Some(a) = self.active.as_mut() {
            a.offset += consumed;
        }
    }

    /// Keeps the second half of a surrogate pair for the next call.
    pub fn hold_pending_unit(&mut self, unit: u16) {
        if let Some(a) = self.active.as_mut() {
            a.pending = Some(unit);
        }
    }

    pub fn take_pending_unit(&mut self) -> Option<u16> {
        self.active.as_mut().and_then(|a| a.pending.take())
    }

    pub fn has_pending_unit(&self) -> bool {
        self.active.is_some_and(|a| a.pending.is_some())
    }

    pub fn remaining(&self) -> bool {
        self.active.is_some_and(|a| !a.exhausted)
    }

    /// Marks the active column as fully delivered.
    pub fn finish(&mut self) {
        if let Some(a) = self.active.as_mut() {
            a.exhausted = true;
            a.pending = None;
        }
    }

    pub fn reset(&mut self) {
        self.active = None;
    }
}

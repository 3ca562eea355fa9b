use crate::engine::cell_store::CellStore;
use crate::error::{DriverError, Result};
use std::fmt;

/// Scroll direction of a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrientation {
    Next,
    Prior,
    First,
    Last,
    /// 1-based row number; negative counts back from the end.
    Absolute(i64),
    Relative(i64),
    /// Zero-based absolute row, as resolved from a bookmark plus offset.
    Bookmark(i64),
}

impl FetchOrientation {
    /// Decodes the standard `SQL_FETCH_*` orientation codes.
    pub fn from_raw(code: i16, offset: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Next),
            2 => Ok(Self::First),
            3 => Ok(Self::Last),
            4 => Ok(Self::Prior),
            5 => Ok(Self::Absolute(offset)),
            6 => Ok(Self::Relative(offset)),
            8 => Ok(Self::Bookmark(offset)),
            other => Err(DriverError::InvalidArgument(format!(
                "Unknown fetch orientation {}",
                other
            ))),
        }
    }
}

impl fmt::Display for FetchOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => write!(f, "NEXT"),
            Self::Prior => write!(f, "PRIOR"),
            Self::First => write!(f, "FIRST"),
            Self::Last => write!(f, "LAST"),
            Self::Absolute(n) => write!(f, "ABSOLUTE({})", n),
            Self::Relative(n) => write!(f, "RELATIVE({})", n),
            Self::Bookmark(n) => write!(f, "BOOKMARK({})", n),
        }
    }
}

/// Result of resolving one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub position: i64,
    /// Contiguous rows available from `position`; 0 means no data.
    pub delivered: usize,
}

impl FetchOutcome {
    pub fn is_no_data(&self) -> bool {
        self.delivered == 0
    }
}

/// Stable identifier of a row within one result set: the id the cell store
/// gave the row, carried as 4 little-endian bytes. It keeps naming the same
/// row while other rows are deleted or appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bookmark(u32);

impl Bookmark {
    pub const LEN: usize = 4;

    pub fn from_id(id: u64) -> Result<Self> {
        u32::try_from(id)
            .map(Self)
            .map_err(|_| DriverError::OutOfRange(format!("Row id {} cannot be bookmarked", id)))
    }

    /// Bookmark of the row currently at index `row`.
    pub fn of_row(store: &CellStore, row: usize) -> Result<Self> {
        let id = store
            .row_id(row)
            .ok_or_else(|| DriverError::OutOfRange(format!("Row {} does not exist", row)))?;
        Self::from_id(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    pub fn to_bytes(self) -> [u8; Self::LEN] {
        self.0.to_le_bytes()
    }

    /// Accepts the 4-byte form and a zero-extended 8-byte form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            4 => Ok(Self(u32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]))),
            8 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                u32::try_from(u64::from_le_bytes(raw))
                    .map(Self)
                    .map_err(|_| DriverError::OutOfRange("Bookmark out of range".to_string()))
            }
            n => Err(DriverError::InvalidArgument(format!(
                "Bookmark must be 4 or 8 bytes, got {}",
                n
            ))),
        }
    }

    /// Current index of the bookmarked row; `OutOfRange` once it was
    /// deleted.
    pub fn resolve(self, store: &CellStore) -> Result<usize> {
        store.find_row(u64::from(self.0)).ok_or_else(|| {
            DriverError::OutOfRange(format!("Bookmarked row {} no longer exists", self.0))
        })
    }
}

/// Tracks the cursor position over a materialised result and resolves fetch
/// requests against it.
///
/// `position` is -1 before the first row and `row_count` after the last.
#[derive(Debug, Clone)]
pub struct CursorNavigator {
    position: i64,
    rowset_size: usize,
    last_delivered: usize,
}

impl Default for CursorNavigator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl CursorNavigator {
    pub fn new(rowset_size: usize) -> Self {
        Self {
            position: -1,
            rowset_size: rowset_size.max(1),
            last_delivered: 0,
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn rowset_size(&self) -> usize {
        self.rowset_size
    }

    pub fn last_delivered(&self) -> usize {
        self.last_delivered
    }

    pub fn set_rowset_size(&mut self, rowset_size: usize) -> Result<()> {
        if rowset_size == 0 {
            return Err(DriverError::InvalidArgument(
                "Row-set size must be at least 1".to_string(),
            ));
        }
        self.rowset_size = rowset_size;
        Ok(())
    }

    /// Back to before-first with nothing delivered.
    pub fn reset(&mut self) {
        self.position = -1;
        self.last_delivered = 0;
    }

    /// Caller offsets are unbounded; targets saturate so that a negative
    /// one is no data and one past the end sits after the last row.
    pub fn fetch(&mut self, orientation: FetchOrientation, row_count: usize) -> FetchOutcome {
        let k = i64::try_from(self.rowset_size).unwrap_or(i64::MAX);
        let rows = i64::try_from(row_count).unwrap_or(i64::MAX);
        let last_delivered = i64::try_from(self.last_delivered).unwrap_or(i64::MAX);
        let pos = self.position;

        let target = match orientation {
            FetchOrientation::First => 0,
            FetchOrientation::Last => rows.saturating_sub(k).max(0),
            FetchOrientation::Next => {
                if pos < 0 {
                    0
                } else {
                    pos.saturating_add(last_delivered)
                }
            }
            FetchOrientation::Prior => {
                if pos <= 0 {
                    -1
                } else {
                    pos.saturating_sub(k)
                }
            }
            FetchOrientation::Absolute(n) => {
                if n >= 1 {
                    n - 1
                } else if n == 0 {
                    -1
                } else {
                    // counting back past the first row lands on it
                    rows.saturating_add(n).max(0)
                }
            }
            FetchOrientation::Relative(n) => {
                let t = pos.saturating_add(n);
                if pos > 0 && t < 0 && n.unsigned_abs() <= k.unsigned_abs() {
                    0
                } else {
                    t
                }
            }
            FetchOrientation::Bookmark(n) => n,
        };

        if target < 0 {
            self.reset();
            return FetchOutcome {
                position: -1,
                delivered: 0,
            };
        }

        let position = target.min(rows);
        let delivered = usize::try_from((rows - position).min(k)).unwrap_or(0);
        self.position = position;
        self.last_delivered = delivered;
        FetchOutcome {
            position,
            delivered,
        }
    }

    /// Absolute row of the 1-based `offset` within the last delivered row-set.
    pub fn rowset_row(&self, offset: usize) -> Result<usize> {
        if offset == 0 || offset > self.last_delivered || self.position < 0 {
            return Err(DriverError::OutOfRange(format!(
                "Row {} is not in the current row-set of {} rows",
                offset, self.last_delivered
            )));
        }
        Ok(self.position as usize + offset - 1)
    }

    /// Shrinks the visible row-set after rows were removed from the result.
    pub fn clamp_to(&mut self, row_count: usize) {
        let rows = i64::try_from(row_count).unwrap_or(i64::MAX);
        if self.position > rows {
            self.position = rows;
        }
        let visible = (rows - self.position.max(0)).max(0) as usize;
        self.last_delivered = self.last_delivered.min(visible);
    }
}

//! Positioned delete, update, refresh and insert against the rows of the
//! current result set.
//!
//! Every change is sent to the engine first and applied to the cell store
//! only once the engine accepted it, so a failed round trip leaves the
//! result untouched. Rows are addressed either relative to the row-set the
//! cursor last delivered or by bookmark.

use crate::codec::CodecOptions;
use crate::engine::cell_store::CellStore;
use crate::engine::connection::Connection;
use crate::engine::cursor::{Bookmark, CursorNavigator};
use crate::error::{DriverError, Result, Warning};
use crate::protocol::param_value::{render_row, render_rows, RenderedRow};
use crate::protocol::response::{quote_identifier, quote_literal, text_to_cell, ResultText};
use crate::protocol::{ColumnDescriptor, ParamValue};

/// Which row an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAddress {
    /// 1-based offset into the row-set last delivered by a fetch.
    Rowset(usize),
    Bookmark(Bookmark),
}

/// Per-row outcome, both in the row status array of a fetch and in the
/// result of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Success,
    Updated,
    Added,
    Error,
    /// No row exists at this address.
    NoRow,
}

/// Outcome of a bulk operation. `statuses` follows the input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkReport {
    pub statuses: Vec<RowStatus>,
    pub warnings: Vec<Warning>,
    /// Failures by input index.
    pub errors: Vec<(usize, DriverError)>,
}

impl BulkReport {
    fn with_len(len: usize) -> Self {
        Self {
            statuses: vec![RowStatus::NoRow; len],
            ..Self::default()
        }
    }

    fn fail(&mut self, index: usize, error: DriverError) {
        self.statuses[index] = RowStatus::Error;
        self.errors.push((index, error));
    }

    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty() && !self.statuses.contains(&RowStatus::NoRow)
    }
}

/// Borrowed view over a statement's result state for the duration of one
/// mutation call.
pub struct PositionMutator<'a> {
    pub(crate) connection: &'a Connection,
    pub(crate) store: &'a mut CellStore,
    pub(crate) navigator: &'a mut CursorNavigator,
    pub(crate) statuses: &'a mut Vec<RowStatus>,
    pub(crate) columns: &'a [ColumnDescriptor],
    pub(crate) table: Option<&'a str>,
    pub(crate) options: CodecOptions,
}

impl PositionMutator<'_> {
    /// Absolute store row for `address`.
    pub fn resolve(&self, address: RowAddress) -> Result<usize> {
        let row = match address {
            RowAddress::Rowset(offset) => self.navigator.rowset_row(offset)?,
            RowAddress::Bookmark(b) => b.resolve(self.store)?,
        };
        if row >= self.store.row_count() {
            return Err(DriverError::OutOfRange(format!("Row {} no longer exists", row)));
        }
        Ok(row)
    }

    fn table(&self) -> Result<&str> {
        self.table.ok_or_else(|| {
            DriverError::InvalidSequence(
                "Result set has no single base table to mutate".to_string(),
            )
        })
    }

    /// WHERE clause matching `row`: key columns when any are flagged,
    /// otherwise every column.
    fn predicate(&self, row: usize) -> Result<String> {
        let view = self
            .store
            .row(row)
            .ok_or_else(|| DriverError::OutOfRange(format!("Row {} no longer exists", row)))?;
        let keyed = self.columns.iter().any(|c| c.key);
        let parts: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !keyed || c.key)
            .map(|(i, c)| match view.get(i).flatten() {
                None => format!("{} IS NULL", quote_identifier(&c.name)),
                Some(bytes) => format!(
                    "{} = {}",
                    quote_identifier(&c.name),
                    quote_literal(Some(bytes), c, self.options.charset)
                ),
            })
            .collect();
        Ok(parts.join(" AND "))
    }

    fn cells(&self, rendered: &RenderedRow) -> Vec<Option<Vec<u8>>> {
        rendered
            .values
            .iter()
            .zip(self.columns)
            .map(|(text, column)| {
                text.as_deref()
                    .map(|t| text_to_cell(t, column.sql_type, self.options.charset))
            })
            .collect()
    }

    fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| quote_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn literals(&self, cells: &[Option<Vec<u8>>]) -> Vec<String> {
        cells
            .iter()
            .zip(self.columns)
            .map(|(cell, column)| quote_literal(cell.as_deref(), column, self.options.charset))
            .collect()
    }

    /// Index into the row status array, when `row` is visible.
    fn rowset_index(&self, row: usize) -> Option<usize> {
        let start = usize::try_from(self.navigator.position()).ok()?;
        let i = row.checked_sub(start)?;
        (i < self.navigator.last_delivered()).then_some(i)
    }

    fn mark(&mut self, row: usize, status: RowStatus) {
        if let Some(i) = self.rowset_index(row) {
            if let Some(slot) = self.statuses.get_mut(i) {
                *slot = status;
            }
        }
    }

    fn delete_row(&mut self, row: usize) -> Result<()> {
        let command = format!(
            "DELETE FROM {} WHERE {}",
            quote_identifier(self.table()?),
            self.predicate(row)?
        );
        self.connection.exchange(&command)?;

        let visible = self.rowset_index(row);
        self.store.remove_row(row)?;
        self.navigator.clamp_to(self.store.row_count());
        if let Some(i) = visible {
            if i < self.statuses.len() {
                self.statuses.remove(i);
                self.statuses.push(RowStatus::NoRow);
            }
        }
        // rows that slid up into the row-set count as delivered
        let delivered = self.navigator.last_delivered();
        for (i, status) in self.statuses.iter_mut().enumerate() {
            if i >= delivered {
                *status = RowStatus::NoRow;
            } else if *status == RowStatus::NoRow {
                *status = RowStatus::Success;
            }
        }
        self.connection
            .logger()
            .log_mutation("DELETE", &[("row", row.to_string())]);
        Ok(())
    }

    fn update_row(&mut self, row: usize, rendered: &RenderedRow) -> Result<()> {
        let cells = self.cells(rendered);
        let assignments: Vec<String> = self
            .columns
            .iter()
            .zip(self.literals(&cells))
            .map(|(c, lit)| format!("{} = {}", quote_identifier(&c.name), lit))
            .collect();
        let command = format!(
            "UPDATE {} SET {} WHERE {}",
            quote_identifier(self.table()?),
            assignments.join(", "),
            self.predicate(row)?
        );
        self.connection.exchange(&command)?;
        self.store.replace_row(row, cells)?;
        self.mark(row, RowStatus::Updated);
        self.connection
            .logger()
            .log_mutation("UPDATE", &[("row", row.to_string())]);
        Ok(())
    }

    /// Re-reads `row`. `Ok(false)` when the engine no longer has it.
    fn refresh_row(&mut self, row: usize) -> Result<bool> {
        let command = format!(
            "SELECT {} FROM {} WHERE {}",
            self.column_list(),
            quote_identifier(self.table()?),
            self.predicate(row)?
        );
        let reply = self.connection.exchange(&command)?;
        let mut result = ResultText::parse(&reply.text, self.options.charset)?;
        match result.row_count() {
            0 => return Ok(false),
            1 => {}
            n => {
                return Err(DriverError::Backend {
                    status: 0,
                    message: format!("Refresh of row {} matched {} rows", row, n),
                })
            }
        }
        let fresh = result.rows.remove(0);
        self.store.replace_row(row, fresh)?;
        self.connection
            .logger()
            .log_mutation("REFRESH", &[("row", row.to_string())]);
        Ok(true)
    }

    fn insert_row(&mut self, rendered: &RenderedRow) -> Result<usize> {
        let cells = self.cells(rendered);
        let command = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(self.table()?),
            self.column_list(),
            self.literals(&cells).join(", ")
        );
        self.connection.exchange(&command)?;
        let row = self.store.append_row(cells)?;
        self.connection
            .logger()
            .log_mutation("INSERT", &[("row", row.to_string())]);
        Ok(row)
    }

    pub fn delete(&mut self, address: RowAddress) -> Result<()> {
        let row = self.resolve(address)?;
        self.delete_row(row)
    }

    pub fn update(&mut self, address: RowAddress, values: &[ParamValue]) -> Result<Vec<Warning>> {
        let row = self.resolve(address)?;
        let rendered = render_row(values, self.columns, &self.options)?;
        self.update_row(row, &rendered)?;
        Ok(rendered.warnings)
    }

    /// Overwrites the row with the engine's current copy. Row count and
    /// cursor position do not change.
    pub fn refresh(&mut self, address: RowAddress) -> Result<()> {
        let row = self.resolve(address)?;
        if !self.refresh_row(row)? {
            return Err(DriverError::OutOfRange(format!(
                "Row {} no longer exists in the backend",
                row
            )));
        }
        Ok(())
    }

    /// Appends a row; returns its absolute index.
    pub fn insert(&mut self, values: &[ParamValue]) -> Result<(usize, Vec<Warning>)> {
        let rendered = render_row(values, self.columns, &self.options)?;
        let row = self.insert_row(&rendered)?;
        Ok((row, rendered.warnings))
    }

    /// Deletes every addressed row. Addresses are resolved before anything is
    /// removed, so offsets keep referring to the row-set as the caller saw it.
    pub fn bulk_delete(&mut self, addresses: &[RowAddress]) -> BulkReport {
        let mut report = BulkReport::with_len(addresses.len());
        let mut targets: Vec<(usize, usize)> = addresses
            .iter()
            .enumerate()
            .filter_map(|(i, a)| self.resolve(*a).ok().map(|row| (row, i)))
            .collect();
        targets.sort_unstable_by(|a, b| b.cmp(a));

        let mut last = None;
        for (row, index) in targets {
            if last == Some(row) {
                continue;
            }
            last = Some(row);
            match self.delete_row(row) {
                Ok(()) => report.statuses[index] = RowStatus::Success,
                Err(e) => report.fail(index, e),
            }
        }
        report
    }

    pub fn bulk_update(&mut self, rows: &[(RowAddress, Vec<ParamValue>)]) -> BulkReport {
        let mut report = BulkReport::with_len(rows.len());
        let values: Vec<Vec<ParamValue>> = rows.iter().map(|(_, v)| v.clone()).collect();
        let rendered = render_rows(&values, self.columns, &self.options);

        for (index, ((address, _), rendered)) in rows.iter().zip(rendered).enumerate() {
            let Ok(row) = self.resolve(*address) else {
                continue;
            };
            let outcome = rendered.and_then(|r| {
                self.update_row(row, &r)?;
                Ok(r.warnings)
            });
            match outcome {
                Ok(warnings) => {
                    report.statuses[index] = RowStatus::Updated;
                    report.warnings.extend(warnings);
                }
                Err(e) => report.fail(index, e),
            }
        }
        report
    }

    pub fn bulk_refresh(&mut self, addresses: &[RowAddress]) -> BulkReport {
        let mut report = BulkReport::with_len(addresses.len());
        for (index, address) in addresses.iter().enumerate() {
            let Ok(row) = self.resolve(*address) else {
                continue;
            };
            match self.refresh_row(row) {
                Ok(true) => report.statuses[index] = RowStatus::Success,
                Ok(false) => {}
                Err(e) => report.fail(index, e),
            }
        }
        report
    }

    pub fn bulk_insert(&mut self, rows: &[Vec<ParamValue>]) -> BulkReport {
        let mut report = BulkReport::with_len(rows.len());
        let rendered = render_rows(rows, self.columns, &self.options);
        for (index, rendered) in rendered.into_iter().enumerate() {
            let outcome = rendered.and_then(|r| {
                self.insert_row(&r)?;
                Ok(r.warnings)
            });
            match outcome {
                Ok(warnings) => {
                    report.statuses[index] = RowStatus::Added;
                    report.warnings.extend(warnings);
                }
                Err(e) => report.fail(index, e),
            }
        }
        report
    }
}

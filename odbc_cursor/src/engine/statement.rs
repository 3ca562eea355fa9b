use crate::codec::{self, binary, CodecOptions, Indicator, Target};
use crate::engine::cell_store::CellStore;
use crate::engine::connection::Connection;
use crate::engine::cursor::{Bookmark, CursorNavigator, FetchOrientation, FetchOutcome};
use crate::engine::diagnostics::{report_error, report_warnings, LogDiagnostics, SharedDiagnostics};
use crate::engine::mutator::{BulkReport, PositionMutator, RowAddress, RowStatus};
use crate::engine::transfer::{ChunkedTransfer, Progress};
use crate::error::{DriverError, Result, Status, Warning};
use crate::observability::StructuredLogger;
use crate::protocol::response::{detect_table, ResultText};
use crate::protocol::{ColumnDescriptor, ParamValue};
use log::Level;
use std::sync::Arc;

/// What one `get_data` call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DataOutcome {
    pub status: Status,
    /// `None` when the call delivered nothing.
    pub indicator: Option<Indicator>,
}

impl DataOutcome {
    fn no_data() -> Self {
        Self {
            status: Status::NoData,
            indicator: None,
        }
    }

    fn delivered(indicator: Indicator, warnings: Vec<Warning>) -> Self {
        Self {
            status: Status::from_warnings(warnings),
            indicator: Some(indicator),
        }
    }
}

/// One result set being read through a connection: the materialised cells,
/// the cursor over them and the per-column transfer state.
pub struct Statement {
    connection: Connection,
    columns: Vec<ColumnDescriptor>,
    store: CellStore,
    navigator: CursorNavigator,
    transfer: ChunkedTransfer,
    statuses: Vec<RowStatus>,
    table: Option<String>,
    /// 1-based row within the current row-set that `get_data` reads.
    current: usize,
    diagnostics: SharedDiagnostics,
    options: CodecOptions,
    use_bookmarks: bool,
    logger: StructuredLogger,
}

impl Statement {
    pub fn new(connection: Connection) -> Self {
        let config = &connection.context().config;
        let options = config.codec_options();
        let use_bookmarks = config.use_bookmarks;
        let navigator = CursorNavigator::new(config.rowset_size);
        let logger = connection.logger();
        Self {
            connection,
            columns: Vec::new(),
            store: CellStore::new(),
            statuses: vec![RowStatus::NoRow; navigator.rowset_size()],
            navigator,
            transfer: ChunkedTransfer::new(),
            table: None,
            current: 1,
            diagnostics: Arc::new(LogDiagnostics),
            options,
            use_bookmarks,
            logger,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: SharedDiagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.store.row_count()
    }

    pub fn position(&self) -> i64 {
        self.navigator.position()
    }

    pub fn rowset_size(&self) -> usize {
        self.navigator.rowset_size()
    }

    /// Takes effect at the next fetch.
    pub fn set_rowset_size(&mut self, rowset_size: usize) -> Result<()> {
        let r = self.navigator.set_rowset_size(rowset_size);
        self.reported(r)?;
        self.statuses.resize(rowset_size, RowStatus::NoRow);
        Ok(())
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Overrides the base table that positioned mutations write to.
    pub fn set_table(&mut self, table: impl Into<String>) {
        self.table = Some(table.into());
    }

    /// Per-row status of the last delivered row-set, one entry per row-set
    /// slot.
    pub fn row_statuses(&self) -> &[RowStatus] {
        &self.statuses
    }

    /// Runs `sql` and loads whatever result set the reply carries. A reply
    /// without one leaves the statement with no columns.
    pub fn execute(&mut self, sql: &str) -> Result<Status> {
        let r = self.execute_inner(sql);
        self.reported(r)
    }

    fn execute_inner(&mut self, sql: &str) -> Result<Status> {
        let reply = self.connection.exchange(sql)?;
        let result = ResultText::parse(&reply.text, self.options.charset)?;
        self.populate(result.columns, result.rows)?;
        self.table = detect_table(sql);
        self.logger.log_exchange(
            Level::Info,
            sql,
            &[
                ("columns", self.columns.len().to_string()),
                ("rows", self.store.row_count().to_string()),
            ],
        );
        Ok(Status::Success)
    }

    /// Loads rows that were materialised elsewhere.
    pub fn load(
        &mut self,
        columns: Vec<ColumnDescriptor>,
        rows: Vec<Vec<Option<Vec<u8>>>>,
    ) -> Result<()> {
        let r = self.populate(columns, rows);
        self.reported(r)?;
        self.table = None;
        Ok(())
    }

    /// Replaces the result only once every row has been written.
    fn populate(
        &mut self,
        columns: Vec<ColumnDescriptor>,
        rows: Vec<Vec<Option<Vec<u8>>>>,
    ) -> Result<()> {
        let mut store = CellStore::with_columns(columns.len());
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DriverError::InvalidArgument(format!(
                    "Row {} has {} cells, result has {} columns",
                    r,
                    row.len(),
                    columns.len()
                )));
            }
            store.advance_row();
            for (c, cell) in row.into_iter().enumerate() {
                match cell {
                    Some(bytes) => store.write_current(c, &bytes)?,
                    None => store.write_current_null(c)?,
                }
            }
        }
        self.columns = columns;
        self.store = store;
        self.reset_cursor();
        Ok(())
    }

    fn reset_cursor(&mut self) {
        self.navigator.reset();
        self.transfer.reset();
        self.current = 1;
        self.statuses.fill(RowStatus::NoRow);
    }

    /// Drops the result set.
    pub fn close(&mut self) {
        self.columns.clear();
        self.store.clear();
        self.table = None;
        self.reset_cursor();
    }

    pub fn fetch(&mut self) -> Result<Status> {
        self.fetch_scroll(FetchOrientation::Next)
    }

    pub fn fetch_scroll(&mut self, orientation: FetchOrientation) -> Result<Status> {
        if self.columns.is_empty() {
            let e = DriverError::InvalidSequence("No result set to fetch from".to_string());
            report_error(self.diagnostics.as_ref(), &e);
            return Err(e);
        }
        let outcome = self.navigator.fetch(orientation, self.store.row_count());
        self.after_fetch(&orientation.to_string(), outcome);
        if outcome.is_no_data() {
            Ok(Status::NoData)
        } else {
            Ok(Status::Success)
        }
    }

    /// Decodes a raw orientation code first; unknown codes are
    /// `InvalidArgument`.
    pub fn fetch_scroll_raw(&mut self, code: i16, offset: i64) -> Result<Status> {
        let orientation = FetchOrientation::from_raw(code, offset);
        let orientation = self.reported(orientation)?;
        self.fetch_scroll(orientation)
    }

    /// Fetches the row-set starting `offset` rows after `bookmark`.
    pub fn fetch_bookmark(&mut self, bookmark: Bookmark, offset: i64) -> Result<Status> {
        let row = bookmark.resolve(&self.store);
        let row = self.reported(row)?;
        let start = i64::try_from(row).unwrap_or(i64::MAX).saturating_add(offset);
        self.fetch_scroll(FetchOrientation::Bookmark(start))
    }

    fn after_fetch(&mut self, orientation: &str, outcome: FetchOutcome) {
        self.transfer.reset();
        self.current = 1;
        self.statuses.fill(RowStatus::NoRow);
        self.statuses[..outcome.delivered].fill(RowStatus::Success);
        self.logger.log_fetch(
            orientation,
            outcome.position,
            outcome.delivered,
            self.store.row_count(),
        );
    }

    /// Makes row `row` (1-based) of the current row-set the one `get_data`
    /// reads.
    pub fn set_position(&mut self, row: usize) -> Result<()> {
        let r = self.navigator.rowset_row(row);
        self.reported(r)?;
        self.current = row;
        self.transfer.reset();
        Ok(())
    }

    /// Absolute index of the row `get_data` reads, if any.
    pub fn current_row(&self) -> Option<usize> {
        self.navigator
            .rowset_row(self.current)
            .ok()
            .filter(|&r| r < self.store.row_count())
    }

    pub fn bookmark(&self) -> Result<Bookmark> {
        let row = self.current_row().ok_or_else(no_current_row)?;
        Bookmark::of_row(&self.store, row)
    }

    /// Reads column `column` (1-based; 0 is the bookmark) of the current row
    /// into `target`. Repeated calls on a variable-length target continue
    /// where the previous one stopped, and report no data once the value is
    /// drained.
    pub fn get_data(&mut self, column: usize, target: &mut Target<'_>) -> Result<DataOutcome> {
        let r = self.get_data_inner(column, target);
        let outcome = self.reported(r)?;
        report_warnings(self.diagnostics.as_ref(), outcome.status.warnings());
        Ok(outcome)
    }

    fn get_data_inner(&mut self, column: usize, target: &mut Target<'_>) -> Result<DataOutcome> {
        let row = self.current_row().ok_or_else(no_current_row)?;
        if column == 0 {
            return self.get_bookmark(row, target);
        }
        let descriptor = self.columns.get(column - 1).ok_or_else(|| {
            DriverError::OutOfRange(format!(
                "Column {} outside result of {} columns",
                column,
                self.columns.len()
            ))
        })?;
        if self.transfer.begin_column(row, column)? == Progress::Exhausted {
            return Ok(DataOutcome::no_data());
        }
        let cell = self.store.value(row, column - 1)?;
        match codec::decode(cell, descriptor, target, &mut self.transfer, &self.options)? {
            Some(c) => Ok(DataOutcome::delivered(c.indicator, c.warnings)),
            None => Ok(DataOutcome::no_data()),
        }
    }

    fn get_bookmark(&mut self, row: usize, target: &mut Target<'_>) -> Result<DataOutcome> {
        if !self.use_bookmarks {
            return Err(DriverError::OutOfRange(
                "Bookmarks are not enabled for this statement".to_string(),
            ));
        }
        let bookmark = Bookmark::of_row(&self.store, row)?;
        if self.transfer.begin_column(row, 0)? == Progress::Exhausted {
            return Ok(DataOutcome::no_data());
        }
        let len = target.buffer_len();
        match target {
            Target::Binary(buf) => {
                let (indicator, warnings) =
                    binary::deliver_binary(&bookmark.to_bytes(), buf, &mut self.transfer);
                Ok(DataOutcome::delivered(indicator, warnings))
            }
            Target::SLong(out) => {
                **out = i32::try_from(bookmark.id()).map_err(|_| {
                    DriverError::Overflow(format!(
                        "Bookmark {} does not fit INTEGER",
                        bookmark.id()
                    ))
                })?;
                self.transfer.finish();
                Ok(DataOutcome::delivered(Indicator::Length(len), Vec::new()))
            }
            Target::ULong(out) => {
                **out = bookmark.id();
                self.transfer.finish();
                Ok(DataOutcome::delivered(Indicator::Length(len), Vec::new()))
            }
            other => Err(DriverError::RestrictedConversion(format!(
                "Bookmark cannot be read as {:?}",
                other.c_type()
            ))),
        }
    }

    /// Positioned operations over this statement's result.
    pub fn mutator(&mut self) -> PositionMutator<'_> {
        PositionMutator {
            connection: &self.connection,
            store: &mut self.store,
            navigator: &mut self.navigator,
            statuses: &mut self.statuses,
            columns: &self.columns,
            table: self.table.as_deref(),
            options: self.options,
        }
    }

    pub fn delete(&mut self, address: RowAddress) -> Result<Status> {
        let r = self.mutator().delete(address);
        self.transfer.reset();
        self.finish(r.map(|()| Vec::new()))
    }

    pub fn update(&mut self, address: RowAddress, values: &[ParamValue]) -> Result<Status> {
        let r = self.mutator().update(address, values);
        self.transfer.reset();
        self.finish(r)
    }

    pub fn refresh(&mut self, address: RowAddress) -> Result<Status> {
        let r = self.mutator().refresh(address);
        self.transfer.reset();
        self.finish(r.map(|()| Vec::new()))
    }

    /// Appends a row and returns its bookmark.
    pub fn insert(&mut self, values: &[ParamValue]) -> Result<(Bookmark, Status)> {
        let inserted = self.mutator().insert(values);
        let r = inserted
            .and_then(|(row, warnings)| Ok((Bookmark::of_row(&self.store, row)?, warnings)));
        let (bookmark, warnings) = self.reported(r)?;
        report_warnings(self.diagnostics.as_ref(), &warnings);
        Ok((bookmark, Status::from_warnings(warnings)))
    }

    pub fn bulk_delete(&mut self, addresses: &[RowAddress]) -> BulkReport {
        let report = self.mutator().bulk_delete(addresses);
        self.transfer.reset();
        self.report_bulk(report)
    }

    pub fn bulk_update(&mut self, rows: &[(RowAddress, Vec<ParamValue>)]) -> BulkReport {
        let report = self.mutator().bulk_update(rows);
        self.transfer.reset();
        self.report_bulk(report)
    }

    pub fn bulk_refresh(&mut self, addresses: &[RowAddress]) -> BulkReport {
        let report = self.mutator().bulk_refresh(addresses);
        self.transfer.reset();
        self.report_bulk(report)
    }

    pub fn bulk_insert(&mut self, rows: &[Vec<ParamValue>]) -> BulkReport {
        let report = self.mutator().bulk_insert(rows);
        self.report_bulk(report)
    }

    fn report_bulk(&self, report: BulkReport) -> BulkReport {
        report_warnings(self.diagnostics.as_ref(), &report.warnings);
        for (index, error) in &report.errors {
            report_error(self.diagnostics.as_ref(), error);
            self.logger
                .log_error(&error.to_string(), &[("row", index.to_string())]);
        }
        report
    }

    fn finish(&self, r: Result<Vec<Warning>>) -> Result<Status> {
        let warnings = self.reported(r)?;
        report_warnings(self.diagnostics.as_ref(), &warnings);
        Ok(Status::from_warnings(warnings))
    }

    /// Forwards a hard failure to the diagnostics sink on its way out.
    fn reported<T>(&self, r: Result<T>) -> Result<T> {
        if let Err(e) = &r {
            report_error(self.diagnostics.as_ref(), e);
        }
        r
    }
}

fn no_current_row() -> DriverError {
    DriverError::InvalidSequence("No current row; fetch a row-set first".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DriverConfig, DriverContext};
    use crate::engine::connection::{Reply, Transport};
    use crate::protocol::SqlType;

    struct Fixed(String);

    impl Transport for Fixed {
        fn exchange(&mut self, _command: &str) -> Result<Reply> {
            Ok(Reply::ok(self.0.clone()))
        }
    }

    fn statement(reply: &str, config: DriverConfig) -> Statement {
        let ctx = DriverContext::new(config, Default::default());
        let conn = Connection::open(Box::new(Fixed(reply.to_string())), ctx).unwrap();
        Statement::new(conn)
    }

    #[test]
    fn test_execute_and_read() {
        let mut st = statement(
            "id\tname\nINTEGER\tVARCHAR(10)\n1\tone\n2\t\\N\n",
            DriverConfig::default(),
        );
        st.execute("SELECT id, name FROM t").unwrap();
        assert_eq!(st.table(), Some("t"));
        assert_eq!(st.row_count(), 2);

        assert_eq!(st.fetch().unwrap(), Status::Success);
        let mut id = 0i32;
        st.get_data(1, &mut Target::SLong(&mut id)).unwrap();
        assert_eq!(id, 1);

        st.fetch().unwrap();
        let mut buf = [0u8; 8];
        let out = st.get_data(2, &mut Target::Char(&mut buf)).unwrap();
        assert_eq!(out.indicator, Some(Indicator::Null));

        assert_eq!(st.fetch().unwrap(), Status::NoData);
    }

    #[test]
    fn test_get_data_before_fetch() {
        let mut st = statement("a\nINTEGER\n1\n", DriverConfig::default());
        st.execute("SELECT a FROM t").unwrap();
        let mut v = 0i32;
        assert!(matches!(
            st.get_data(1, &mut Target::SLong(&mut v)),
            Err(DriverError::InvalidSequence(_))
        ));
    }

    #[test]
    fn test_fixed_target_then_no_data() {
        let mut st = statement("a\nINTEGER\n42\n", DriverConfig::default());
        st.execute("SELECT a FROM t").unwrap();
        st.fetch().unwrap();
        let mut v = 0i64;
        st.get_data(1, &mut Target::SBigInt(&mut v)).unwrap();
        assert_eq!(v, 42);
        let again = st.get_data(1, &mut Target::SBigInt(&mut v)).unwrap();
        assert!(again.status.is_no_data());
    }

    #[test]
    fn test_bookmark_column() {
        let config = DriverConfig {
            use_bookmarks: true,
            rowset_size: 2,
            ..DriverConfig::default()
        };
        let mut st = statement("a\nINTEGER\n1\n2\n3\n", config);
        st.execute("SELECT a FROM t").unwrap();
        st.fetch_scroll(FetchOrientation::Absolute(2)).unwrap();
        st.set_position(2).unwrap();

        let mut raw = [0u8; 4];
        st.get_data(0, &mut Target::Binary(&mut raw)).unwrap();
        assert_eq!(Bookmark::from_bytes(&raw).unwrap().id(), 2);

        let mut v = 0.0f64;
        assert!(matches!(
            st.get_data(0, &mut Target::Double(&mut v)),
            Err(DriverError::RestrictedConversion(_))
        ));

        let b = st.bookmark().unwrap();
        st.fetch_scroll(FetchOrientation::First).unwrap();
        st.fetch_bookmark(b, 0).unwrap();
        assert_eq!(st.position(), 2);
    }

    #[test]
    fn test_row_statuses_and_set_position() {
        let config = DriverConfig {
            rowset_size: 3,
            ..DriverConfig::default()
        };
        let mut st = statement("a\nINTEGER\n1\n2\n3\n4\n", config);
        st.execute("SELECT a FROM t").unwrap();
        st.fetch_scroll(FetchOrientation::Absolute(3)).unwrap();
        assert_eq!(
            st.row_statuses(),
            &[RowStatus::Success, RowStatus::Success, RowStatus::NoRow]
        );
        assert!(st.set_position(3).is_err());
        st.set_position(2).unwrap();
        assert_eq!(st.current_row(), Some(3));
    }

    #[test]
    fn test_load_rejects_ragged_rows_and_keeps_result() {
        let mut st = statement("", DriverConfig::default());
        let cols = vec![ColumnDescriptor::new("a", SqlType::Integer)];
        st.load(cols.clone(), vec![vec![Some(b"1".to_vec())]]).unwrap();
        assert!(st.load(cols, vec![vec![None, None]]).is_err());
        assert_eq!(st.row_count(), 1);
    }

    #[test]
    fn test_unknown_raw_orientation() {
        let mut st = statement("a\nINTEGER\n1\n", DriverConfig::default());
        st.execute("SELECT a FROM t").unwrap();
        assert!(matches!(
            st.fetch_scroll_raw(42, 0),
            Err(DriverError::InvalidArgument(_))
        ));
        assert_eq!(st.fetch_scroll_raw(2, 0).unwrap(), Status::Success);
    }
}

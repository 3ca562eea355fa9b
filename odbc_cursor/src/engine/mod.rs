pub mod cell_store;
pub mod connection;
pub mod cursor;
pub mod diagnostics;
pub mod mutator;
pub mod statement;
pub mod transfer;

pub use cell_store::{CellStore, RowView};
pub use connection::{AccessToken, Connection, Reply, Transport};
pub use cursor::{Bookmark, CursorNavigator, FetchOrientation, FetchOutcome};
pub use diagnostics::{Diagnostics, LogDiagnostics, Severity, SharedDiagnostics};
pub use mutator::{BulkReport, PositionMutator, RowAddress, RowStatus};
pub use statement::{DataOutcome, Statement};
pub use transfer::{ChunkedTransfer, Progress};

pub mod codec;
pub mod config;
pub mod engine;
mod error;
pub mod observability;
pub mod protocol;

pub use codec::{Charset, CodecOptions, Indicator, Target};
pub use config::{Credentials, DriverConfig, DriverContext};
pub use engine::{
    Bookmark, BulkReport, CellStore, Connection, CursorNavigator, DataOutcome, Diagnostics,
    FetchOrientation, Reply, RowAddress, RowStatus, Severity, Statement, Transport,
};
pub use error::{DriverError, ErrorCategory, Result, Status, Warning, WarningKind};
pub use protocol::{ColumnDescriptor, CType, Date, Numeric, ParamValue, SqlType, Time, Timestamp};

#[cfg(feature = "test-helpers")]
pub mod test_helpers {
    /// Loads `.env` from the working directory, if there is one.
    pub fn load_dotenv() {
        let _ = dotenvy::dotenv();
    }
}

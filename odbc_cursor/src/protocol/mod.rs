pub mod param_value;
pub mod response;
pub mod types;

pub use param_value::{render_row, render_rows, ParamValue, RenderedRow};
pub use response::{detect_table, quote_identifier, quote_literal, ResultText};
pub use types::{CType, ColumnDescriptor, Date, Numeric, SqlType, Time, Timestamp};

pub mod diagnostics;
pub mod env;
pub mod transport;

#[allow(unused_imports)]
pub use diagnostics::RecordingDiagnostics;
#[allow(unused_imports)]
pub use env::get_test_config;
#[allow(unused_imports)]
pub use transport::Script;

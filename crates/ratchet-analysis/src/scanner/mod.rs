//! Scanner subsystem: file-set resolution, exclusion, parallel rule
//! evaluation under a budget, deterministic aggregation.

pub mod file_set;
pub mod scanner;
pub mod types;

pub use file_set::FileSet;
pub use scanner::Scanner;
pub use types::{ScanReport, ScanStats, ScanWarning};

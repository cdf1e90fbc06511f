//! Error handling for the ratchet engine.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod error_code;
pub mod history_error;
pub mod ratchet_error;
pub mod rule_error;
pub mod scan_error;
pub mod store_error;

pub use config_error::ConfigError;
pub use error_code::RatchetErrorCode;
pub use history_error::HistoryError;
pub use ratchet_error::RatchetError;
pub use rule_error::RuleError;
pub use scan_error::ScanError;
pub use store_error::StoreError;

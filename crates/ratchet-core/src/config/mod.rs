//! Configuration system for the ratchet engine.
//! TOML-based, 4-layer resolution: CLI > env > project > user > defaults.

pub mod cache_config;
pub mod history_config;
pub mod ratchet_config;
pub mod scan_config;
pub mod store_config;

pub use cache_config::CacheConfig;
pub use history_config::HistoryConfig;
pub use ratchet_config::{CliOverrides, RatchetConfig};
pub use scan_config::ScanConfig;
pub use store_config::StoreConfig;

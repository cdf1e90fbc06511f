//! Persistence port for allowed violation counts.

use std::collections::BTreeMap;

use crate::errors::StoreError;

/// Flat rule name → allowed count mapping. Ordered so that the persisted
/// form diffs cleanly.
pub type RuleCounts = BTreeMap<String, u64>;

/// Loads and saves the persisted counts.
///
/// A missing backing file loads as an empty map.
pub trait CountsPort: Send + Sync {
    fn load(&self) -> Result<RuleCounts, StoreError>;

    fn save(&self, counts: &RuleCounts) -> Result<(), StoreError>;

    /// Human-readable location, used in logs.
    fn location(&self) -> String;
}

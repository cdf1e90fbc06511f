//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;
pub use std::collections::BTreeMap;

/// Parent lists: almost always one id, two for merges.
pub type ParentIds = SmallVec<[String; 2]>;

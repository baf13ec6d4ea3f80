//! Stock split adjustment of persisted holdings.

mod split_adjuster;

pub use split_adjuster::*;

//! Region bookkeeping for filters.

pub mod partition;

pub use partition::{partition, subtract, Partition};

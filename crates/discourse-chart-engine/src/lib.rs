pub mod chart;
pub mod charting;
pub mod error;
pub mod model;
pub mod occurrence;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types for easier usage
pub use chart::{Chart, ChartId, ChartSettings, OrderingViolation};
pub use charting::*;
pub use error::ChartError;
pub use model::*;
pub use occurrence::*;
pub use store::{ChartStore, RowRemoval, UndoHistory};

pub mod aggregate;
pub mod selection;

pub use aggregate::{Aggregator, MetricWeights};
pub use selection::{PenaltyPolicy, Selection, SelectionPolicy};

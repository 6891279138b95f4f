//! Results domain.
//!
//! Per-side totals and the winner of a finalized debate, either reported by
//! the server or computed locally by the [`aggregator::ResultsAggregator`].

pub mod aggregator;
pub mod entities;
pub mod metric;

pub use aggregator::ResultsAggregator;
pub use entities::{Outcome, RatedScore, Results, ResultsSource, TieBreak};
pub use metric::{MAX_SUB_SCORE, Metric};

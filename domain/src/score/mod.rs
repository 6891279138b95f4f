//! Score domain.
//!
//! - [`raw::RawScore`]: the oracle's payload as a tagged union
//! - [`normalizer::normalize`]: reduce any payload to a [`normalizer::NormalizedScore`]

pub mod normalizer;
pub mod raw;

pub use normalizer::{NormalizedScore, SourceKind, TOTAL_METRIC, normalize};
pub use raw::{MetricValue, RawScore, parse_numeric_str};

//! Epoch Extractor - Temporal inference pipeline
//!
//! Parses fuzzy historical dates, bounds each person's active period,
//! classifies that period into centuries and propagates estimates
//! to persons known only through their relations.

pub mod century;
pub mod dates;
pub mod edtf;
pub mod pipeline;
pub mod relation;

pub use century::{CenturyClassifier, Classification};
pub use dates::{truncate_year, PersonDateExtractor};
pub use edtf::{parse_fuzzy_date, YearPair};
pub use pipeline::{InferencePipeline, Inspection};
pub use relation::{RelationCategory, RelationTable, RelationshipPropagator, TemporalTransform};

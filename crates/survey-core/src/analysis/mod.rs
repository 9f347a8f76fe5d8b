//! Offline aggregation of the survey logs.
//!
//! Both aggregators are single pass over in-memory records and hold their
//! tallies in local accumulators.

pub mod demographics;
pub mod preference;

pub use demographics::{summarize_demographics, CrossTab, DemographicsSummary};
pub use preference::{aggregate_preferences, Outcome, PreferenceReport, PreferenceTally, ReasonCounts};

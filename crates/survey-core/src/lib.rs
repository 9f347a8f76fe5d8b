pub mod analysis;
pub mod chart;
pub mod config;
pub mod errors;
pub mod form;
pub mod index;
pub mod model;
pub mod report;
pub mod storage;

pub use errors::{SurveyError, SurveyResult, ValidationError};

pub mod csv_log;
pub mod readers;
pub mod schema;
pub mod sessions;

pub use csv_log::{CsvLog, SubmissionLog};
pub use sessions::{SessionRecord, SessionStore};

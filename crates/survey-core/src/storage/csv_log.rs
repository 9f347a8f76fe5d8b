use crate::errors::SurveyResult;
use crate::form::Submission;
use crate::storage::schema::{DEMOGRAPHICS_HEADER, RESPONSES_HEADER};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only CSV file whose header is written on first use.
#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
    header: &'static [&'static str],
}

/// Where a log stood before an append, so the append can be undone.
#[derive(Debug, Clone, Copy)]
pub struct AppendMark {
    existed: bool,
    len: u64,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>, header: &'static [&'static str]) -> Self {
        Self {
            path: path.into(),
            header,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `rows`, writing the header first if the file is new or empty.
    ///
    /// On error the file is restored to its length before the call.
    pub fn append<T: Serialize>(&self, rows: &[T]) -> SurveyResult<AppendMark> {
        let mark = match std::fs::metadata(&self.path) {
            Ok(meta) => AppendMark {
                existed: true,
                len: meta.len(),
            },
            Err(_) => AppendMark {
                existed: false,
                len: 0,
            },
        };

        let file = self.open()?;
        if let Err(e) = self.write_rows(file, rows, mark.len == 0) {
            if let Err(undo) = self.rollback(mark) {
                tracing::error!(
                    event = "append_rollback_failed",
                    file = %self.path.display(),
                    error = %undo
                );
            }
            return Err(e);
        }
        Ok(mark)
    }

    fn open(&self) -> SurveyResult<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?)
    }

    fn write_rows<T: Serialize>(&self, file: File, rows: &[T], with_header: bool) -> SurveyResult<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if with_header {
            wtr.write_record(self.header)?;
        }
        for row in rows {
            wtr.serialize(row)?;
        }
        let mut file = wtr
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()))?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    /// Restores the file to the state recorded in `mark`.
    pub fn rollback(&self, mark: AppendMark) -> SurveyResult<()> {
        if !mark.existed {
            match std::fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            return Ok(());
        }
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.set_len(mark.len)?;
        file.sync_data()?;
        Ok(())
    }
}

/// Demographics and responses written as one unit.
///
/// Appends are serialized through an internal lock; if the responses append
/// fails, the demographics row is rolled back.
#[derive(Debug)]
pub struct SubmissionLog {
    demographics: CsvLog,
    responses: CsvLog,
    lock: Mutex<()>,
}

impl SubmissionLog {
    pub fn new(demographics: impl Into<PathBuf>, responses: impl Into<PathBuf>) -> Self {
        Self::from_logs(
            CsvLog::new(demographics, DEMOGRAPHICS_HEADER),
            CsvLog::new(responses, RESPONSES_HEADER),
        )
    }

    pub fn from_logs(demographics: CsvLog, responses: CsvLog) -> Self {
        Self {
            demographics,
            responses,
            lock: Mutex::new(()),
        }
    }

    pub fn demographics_path(&self) -> &Path {
        self.demographics.path()
    }

    pub fn responses_path(&self) -> &Path {
        self.responses.path()
    }

    pub fn record(&self, submission: &Submission) -> SurveyResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let demo_mark = self
            .demographics
            .append(std::slice::from_ref(&submission.demographics))?;

        if let Err(e) = self.responses.append(&submission.responses) {
            tracing::error!(
                event = "submission_write_failed",
                submission_id = %submission.submission_id,
                file = %self.responses.path().display(),
                error = %e
            );
            if let Err(rb) = self.demographics.rollback(demo_mark) {
                tracing::error!(
                    event = "submission_rollback_failed",
                    submission_id = %submission.submission_id,
                    file = %self.demographics.path().display(),
                    error = %rb
                );
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Choice, DemographicRecord, ResponseRecord};
    use serde::Serializer;

    /// Row whose serialization fails when `broken` is set.
    struct Row {
        id: &'static str,
        broken: bool,
    }

    impl Serialize for Row {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            if self.broken {
                return Err(serde::ser::Error::custom("unwritable row"));
            }
            (self.id, "5", "expert").serialize(s)
        }
    }

    fn submission(id: &str) -> Submission {
        Submission {
            submission_id: id.into(),
            demographics: DemographicRecord {
                submission_id: id.into(),
                experience_years: "5".into(),
                python_skill_level: "expert".into(),
            },
            responses: vec![ResponseRecord {
                submission_id: id.into(),
                pair: "pair_1".into(),
                image_a: "o.png".into(),
                image_b: "r.png".into(),
                chosen: Choice::B,
                reason: "concise;readable".into(),
            }],
        }
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = SubmissionLog::new(dir.path().join("d.csv"), dir.path().join("r.csv"));
        log.record(&submission("s1")).unwrap();
        log.record(&submission("s2")).unwrap();

        let responses = std::fs::read_to_string(dir.path().join("r.csv")).unwrap();
        let lines: Vec<_> = responses.lines().collect();
        assert_eq!(lines[0], "submission_id,pair,image_A,image_B,chosen,reason");
        assert_eq!(lines[1], "s1,pair_1,o.png,r.png,B,concise;readable");
        assert_eq!(lines.len(), 3);

        let demo = std::fs::read_to_string(dir.path().join("d.csv")).unwrap();
        assert_eq!(
            demo.lines().collect::<Vec<_>>(),
            vec![
                "submission_id,experience_years,python_skill_level",
                "s1,5,expert",
                "s2,5,expert"
            ]
        );
    }

    #[test]
    fn empty_existing_file_still_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.csv");
        std::fs::write(&path, "").unwrap();
        let log = CsvLog::new(&path, DEMOGRAPHICS_HEADER);
        log.append(&[submission("s1").demographics]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("submission_id,"));
    }

    #[test]
    fn failed_response_append_rolls_back_demographics() {
        let dir = tempfile::tempdir().unwrap();
        let demo_path = dir.path().join("d.csv");
        // A directory where the responses file should be makes the append fail.
        let resp_path = dir.path().join("r.csv");
        std::fs::create_dir(&resp_path).unwrap();

        let log = SubmissionLog::new(&demo_path, &resp_path);
        assert!(log.record(&submission("s1")).is_err());
        assert!(!demo_path.exists());

        std::fs::write(&demo_path, "submission_id,experience_years,python_skill_level\nold,1,beginner\n").unwrap();
        let before = std::fs::read_to_string(&demo_path).unwrap();
        assert!(log.record(&submission("s2")).is_err());
        assert_eq!(std::fs::read_to_string(&demo_path).unwrap(), before);

        // A header narrower than the rows fails after the header is written.
        let resp_path = dir.path().join("r2.csv");
        std::fs::write(&resp_path, "").unwrap();
        let log = SubmissionLog::from_logs(
            CsvLog::new(&demo_path, DEMOGRAPHICS_HEADER),
            CsvLog::new(&resp_path, &["submission_id", "pair"]),
        );
        assert!(log.record(&submission("s3")).is_err());
        assert_eq!(std::fs::read_to_string(&resp_path).unwrap(), "");
        assert_eq!(std::fs::read_to_string(&demo_path).unwrap(), before);
    }

    #[test]
    fn failed_append_restores_prior_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.csv");
        let log = CsvLog::new(&path, DEMOGRAPHICS_HEADER);
        log.append(&[Row { id: "s1", broken: false }]).unwrap();
        let before = std::fs::read(&path).unwrap();

        let rows = [
            Row { id: "s2", broken: false },
            Row { id: "s3", broken: true },
        ];
        assert!(log.append(&rows).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), before);

        log.append(&[Row { id: "s4", broken: false }]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec!["submission_id,experience_years,python_skill_level", "s1,5,expert", "s4,5,expert"]
        );
    }

    #[test]
    fn failed_first_append_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.csv");
        let log = CsvLog::new(&path, DEMOGRAPHICS_HEADER);

        assert!(log.append(&[Row { id: "s1", broken: true }]).is_err());
        assert!(!path.exists());
    }
}

use crate::errors::{SurveyError, SurveyResult};
use crate::model::{Choice, DemographicRecord, ResponseRecord};
use std::path::Path;

/// Responses read back from the log, plus rows that could not be used.
#[derive(Debug, Clone, Default)]
pub struct ResponseLog {
    pub records: Vec<ResponseRecord>,
    /// Rows whose `chosen` value was not A, B or C.
    pub skipped: usize,
}

fn open_reader(path: &Path) -> SurveyResult<csv::Reader<std::fs::File>> {
    let file = std::fs::File::open(path).map_err(|source| SurveyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new().flexible(true).from_reader(file))
}

pub fn read_responses(path: &Path) -> SurveyResult<ResponseLog> {
    let mut rdr = open_reader(path)?;
    let headers = rdr.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (Some(id_i), Some(chosen_i), Some(a_i), Some(b_i)) =
        (col("submission_id"), col("chosen"), col("image_A"), col("image_B"))
    else {
        return Err(SurveyError::Config(format!(
            "{} is missing one of submission_id, image_A, image_B, chosen",
            path.display()
        )));
    };
    let pair_i = col("pair");
    // Older logs wrote a five-column header above six-column rows.
    let reason_i = col("reason").unwrap_or(headers.len());

    let mut log = ResponseLog::default();
    for (line, row) in rdr.records().enumerate() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or("").trim().to_string();

        let raw_choice = field(chosen_i);
        let Some(chosen) = Choice::parse(&raw_choice) else {
            tracing::warn!(
                event = "response_row_skipped",
                file = %path.display(),
                row = line + 2,
                chosen = %raw_choice
            );
            log.skipped += 1;
            continue;
        };

        log.records.push(ResponseRecord {
            submission_id: field(id_i),
            pair: pair_i.map(field).unwrap_or_default(),
            image_a: field(a_i),
            image_b: field(b_i),
            chosen,
            reason: field(reason_i),
        });
    }
    Ok(log)
}

pub fn read_demographics(path: &Path) -> SurveyResult<Vec<DemographicRecord>> {
    let mut rdr = open_reader(path)?;
    let mut out = Vec::new();
    for row in rdr.deserialize() {
        let rec: DemographicRecord = row?;
        out.push(rec);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_header_without_reason_reads_sixth_field() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("responses.csv");
        std::fs::write(
            &p,
            "submission_id,pair,image_A,image_B,chosen\n\
             s1,pair_1,o.png,r.png,A,concise\n\
             s1,pair_2,o2.png,r2.png,B\n",
        )
        .unwrap();
        let log = read_responses(&p).unwrap();
        assert_eq!(log.records.len(), 2);
        assert_eq!(log.records[0].reason, "concise");
        assert_eq!(log.records[1].reason, "");
        assert_eq!(log.records[1].chosen, Choice::B);
    }

    #[test]
    fn unknown_choice_rows_are_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("responses.csv");
        std::fs::write(
            &p,
            "submission_id,pair,image_A,image_B,chosen,reason\n\
             s1,pair_1,o.png,r.png,,\n\
             s1,pair_2,o.png,r.png,C,\n",
        )
        .unwrap();
        let log = read_responses(&p).unwrap();
        assert_eq!(log.skipped, 1);
        assert_eq!(log.records[0].chosen, Choice::NoPreference);
    }

    #[test]
    fn demographics_tolerate_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("demographics.csv");
        std::fs::write(
            &p,
            "submission_id,experience_years,python_skill_level\ns1,,\ns2,4,expert\n",
        )
        .unwrap();
        let rows = read_demographics(&p).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].skill(), None);
        assert_eq!(rows[1].python_skill_level, "expert");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_demographics(Path::new("/nonexistent/demographics.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/demographics.csv"));
    }
}

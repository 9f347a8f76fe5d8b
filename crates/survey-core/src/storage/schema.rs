pub const RESPONSES_HEADER: &[&str] = &[
    "submission_id",
    "pair",
    "image_A",
    "image_B",
    "chosen",
    "reason",
];

pub const DEMOGRAPHICS_HEADER: &[&str] = &["submission_id", "experience_years", "python_skill_level"];

pub const SESSIONS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS survey_sessions (
  token_sha256 TEXT PRIMARY KEY,
  pairs_json TEXT NOT NULL,
  created_at TEXT NOT NULL,
  submitted_at TEXT,
  submission_id TEXT
);
CREATE INDEX IF NOT EXISTS survey_sessions_created ON survey_sessions(created_at);
"#;

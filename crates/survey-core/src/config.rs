use crate::errors::{SurveyError, SurveyResult};
use crate::storage::sessions::{DEFAULT_SESSION_TTL_SECS, MAX_SESSION_TTL_SECS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod path_resolver;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

pub const DEFAULT_NUM_PAIRS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(default, rename = "configVersion", alias = "version")]
    pub version: u32,
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default = "default_index_file")]
    pub index_file: PathBuf,
    #[serde(default = "default_responses_file")]
    pub responses_file: PathBuf,
    #[serde(default = "default_demographics_file")]
    pub demographics_file: PathBuf,
    #[serde(default = "default_session_db")]
    pub session_db: PathBuf,
    #[serde(default = "default_num_pairs")]
    pub num_pairs: usize,
    /// Swap A/B per pair so the original is not always on the left.
    #[serde(default)]
    pub randomize_sides: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Seconds an unsubmitted session stays valid.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("Human_survey")
}

fn default_index_file() -> PathBuf {
    PathBuf::from("Human_survey/survey_index.csv")
}

fn default_responses_file() -> PathBuf {
    PathBuf::from("Human_survey/responses.csv")
}

fn default_demographics_file() -> PathBuf {
    PathBuf::from("Human_survey/demographics.csv")
}

fn default_session_db() -> PathBuf {
    PathBuf::from("Human_survey/sessions.db")
}

fn default_num_pairs() -> usize {
    DEFAULT_NUM_PAIRS
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            image_dir: default_image_dir(),
            index_file: default_index_file(),
            responses_file: default_responses_file(),
            demographics_file: default_demographics_file(),
            session_db: default_session_db(),
            num_pairs: DEFAULT_NUM_PAIRS,
            randomize_sides: false,
            seed: None,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

/// Loads `path` if given, otherwise returns the defaults.
pub fn load_or_default(path: Option<&Path>, strict: bool) -> SurveyResult<SurveyConfig> {
    match path {
        Some(p) => load_config(p, strict),
        None => Ok(SurveyConfig::default()),
    }
}

pub fn load_config(path: &Path, strict: bool) -> SurveyResult<SurveyConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SurveyError::Config(format!("failed to read config {}: {}", path.display(), e))
    })?;

    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);

    let mut cfg: SurveyConfig = serde_ignored::deserialize(deserializer, |p| {
        ignored_keys.insert(p.to_string());
    })
    .map_err(|e| SurveyError::Config(format!("failed to parse YAML: {}", e)))?;

    let meaningful_unknowns: Vec<_> = ignored_keys
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();

    if !meaningful_unknowns.is_empty() {
        if strict {
            return Err(SurveyError::Config(format!(
                "Unknown fields detected in strict mode: {:?} (file: {})",
                meaningful_unknowns,
                path.display()
            )));
        }
        tracing::warn!(
            event = "config_unknown_fields",
            fields = ?meaningful_unknowns,
            file = %path.display()
        );
    }

    if cfg.version != 0 && cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(SurveyError::Config(format!(
            "unsupported config version {} (supported: 0, {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }

    if cfg.num_pairs == 0 {
        return Err(SurveyError::Config("num_pairs must be at least 1".into()));
    }

    if cfg.session_ttl_secs == 0 || cfg.session_ttl_secs > MAX_SESSION_TTL_SECS {
        return Err(SurveyError::Config(format!(
            "session_ttl_secs must be between 1 and {}",
            MAX_SESSION_TTL_SECS
        )));
    }

    normalize_paths(&mut cfg, path);
    Ok(cfg)
}

fn normalize_paths(cfg: &mut SurveyConfig, config_path: &Path) {
    let r = path_resolver::PathResolver::new(config_path);
    r.resolve(&mut cfg.image_dir);
    r.resolve(&mut cfg.index_file);
    r.resolve(&mut cfg.responses_file);
    r.resolve(&mut cfg.demographics_file);
    r.resolve(&mut cfg.session_db);
}

pub const SAMPLE_CONFIG: &str = r#"configVersion: 1
# Directory the form's images are served from.
image_dir: Human_survey
index_file: Human_survey/survey_index.csv
responses_file: Human_survey/responses.csv
demographics_file: Human_survey/demographics.csv
session_db: Human_survey/sessions.db
num_pairs: 10
randomize_sides: false
# Unsubmitted sessions older than this are discarded.
session_ttl_secs: 7200
"#;

pub fn write_sample_config(path: &Path) -> SurveyResult<()> {
    std::fs::write(path, SAMPLE_CONFIG)
        .map_err(|e| SurveyError::Config(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_round_trips_to_defaults() {
        let cfg: SurveyConfig = serde_yaml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(cfg, SurveyConfig::default());
    }

    #[test]
    fn missing_path_yields_defaults() {
        let cfg = load_or_default(None, true).unwrap();
        assert_eq!(cfg.num_pairs, 10);
        assert_eq!(cfg.responses_file, PathBuf::from("Human_survey/responses.csv"));
    }

    fn write(dir: &Path, body: &str) -> PathBuf {
        let p = dir.join("survey.yaml");
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "configVersion: 1\nindex_file: data/index.csv\nseed: 42\n");

        let cfg = load_config(&p, true).unwrap();
        assert_eq!(cfg.index_file, dir.path().join("data/index.csv"));
        assert_eq!(cfg.image_dir, dir.path().join("Human_survey"));
        assert_eq!(cfg.seed, Some(42));
    }

    #[test]
    fn unknown_keys_fail_only_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "num_pair: 3\n_comment: ignored\n");

        let err = load_config(&p, true).unwrap_err();
        assert!(err.to_string().contains("num_pair"));
        assert!(!err.to_string().contains("_comment"));
        assert_eq!(load_config(&p, false).unwrap().num_pairs, DEFAULT_NUM_PAIRS);
    }

    #[test]
    fn bad_version_and_zero_pairs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "configVersion: 2\n");
        assert!(matches!(load_config(&p, false), Err(SurveyError::Config(_))));

        let p = write(dir.path(), "num_pairs: 0\n");
        assert!(matches!(load_config(&p, false), Err(SurveyError::Config(_))));

        let p = write(dir.path(), "session_ttl_secs: 0\n");
        assert!(matches!(load_config(&p, false), Err(SurveyError::Config(_))));
    }
}

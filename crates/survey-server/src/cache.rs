use moka::sync::Cache;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use survey_core::index::{parse_index, ImageCatalog};
use survey_core::model::SurveyIndexEntry;
use survey_core::{SurveyError, SurveyResult};

/// One parsed index file plus the set of image names it lists.
#[derive(Debug)]
pub struct IndexSnapshot {
    pub entries: Vec<SurveyIndexEntry>,
    pub catalog: ImageCatalog,
}

impl IndexSnapshot {
    pub fn new(entries: Vec<SurveyIndexEntry>) -> Self {
        let catalog = ImageCatalog::from_entries(&entries);
        Self { entries, catalog }
    }
}

pub type ParsedIndex = Arc<IndexSnapshot>;

/// Parsed survey index files keyed by path and content hash, so an edited
/// index is re-parsed on the next request.
pub struct IndexCache {
    pub entries: Cache<String, ParsedIndex>,
}

impl IndexCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            entries: Cache::new(max_entries),
        }
    }

    pub fn load(&self, path: &Path) -> SurveyResult<ParsedIndex> {
        let bytes = std::fs::read(path).map_err(|source| SurveyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let abs = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let k = key(&abs.to_string_lossy(), &sha256_hex(&bytes));

        if let Some(hit) = self.entries.get(&k) {
            return Ok(hit);
        }
        let parsed: ParsedIndex = Arc::new(IndexSnapshot::new(parse_index(&bytes)?));
        self.entries.insert(k, parsed.clone());
        tracing::debug!(
            event = "index_parsed",
            path = %path.display(),
            entries = parsed.entries.len()
        );
        Ok(parsed)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn key(abs_path: &str, sha: &str) -> String {
    format!("{}:{}", abs_path, sha)
}

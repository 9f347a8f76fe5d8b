use crate::errors::SurveyResult;
use crate::model::ImagePair;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// How long an unsubmitted session stays usable.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 2 * 60 * 60;
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Server-side record of which pairs a client was shown and whether it has
/// already submitted. Tokens are stored hashed.
///
/// Unsubmitted sessions older than the TTL are invisible to `get` and
/// `claim` and are deleted whenever a new session is created. Submitted
/// sessions are kept.
#[derive(Clone)]
pub struct SessionStore {
    pub conn: Arc<Mutex<Connection>>,
    ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub pairs: Vec<ImagePair>,
    pub created_at: String,
    pub submitted_at: Option<String>,
    pub submission_id: Option<String>,
}

impl SessionRecord {
    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}

pub fn token_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// Fixed-width UTC so stored timestamps compare correctly as text.
fn stamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl SessionStore {
    pub fn open(path: &Path) -> SurveyResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS as i64),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn memory() -> SurveyResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS as i64),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn init_schema(&self) -> SurveyResult<()> {
        let conn = self.lock();
        conn.execute_batch(crate::storage::schema::SESSIONS_DDL)?;
        Ok(())
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl = Duration::seconds(ttl_secs.min(MAX_SESSION_TTL_SECS) as i64);
        self
    }

    fn cutoff(&self, now: DateTime<Utc>) -> String {
        stamp(now - self.ttl)
    }

    pub fn create(&self, token: &str, pairs: &[ImagePair]) -> SurveyResult<()> {
        self.create_at(token, pairs, Utc::now())
    }

    /// Stores a session created at `now`, pruning expired ones first.
    pub fn create_at(&self, token: &str, pairs: &[ImagePair], now: DateTime<Utc>) -> SurveyResult<()> {
        let pairs_json = serde_json::to_string(pairs)?;
        let conn = self.lock();
        let pruned = conn.execute(
            "DELETE FROM survey_sessions WHERE submitted_at IS NULL AND created_at < ?1",
            params![self.cutoff(now)],
        )?;
        if pruned > 0 {
            tracing::debug!(event = "sessions_pruned", count = pruned);
        }
        conn.execute(
            "INSERT INTO survey_sessions (token_sha256, pairs_json, created_at) VALUES (?1, ?2, ?3)",
            params![token_hash(token), pairs_json, stamp(now)],
        )?;
        Ok(())
    }

    pub fn get(&self, token: &str) -> SurveyResult<Option<SessionRecord>> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT pairs_json, created_at, submitted_at, submission_id
                 FROM survey_sessions
                 WHERE token_sha256 = ?1 AND (submitted_at IS NOT NULL OR created_at >= ?2)",
                params![token_hash(token), self.cutoff(Utc::now())],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((pairs_json, created_at, submitted_at, submission_id)) = row else {
            return Ok(None);
        };
        Ok(Some(SessionRecord {
            pairs: serde_json::from_str(&pairs_json)?,
            created_at,
            submitted_at,
            submission_id,
        }))
    }

    /// Marks the session submitted. Returns `false` if it already was (or
    /// does not exist or has expired), so only one caller can win.
    pub fn claim(&self, token: &str, submission_id: &str) -> SurveyResult<bool> {
        let now = Utc::now();
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE survey_sessions SET submitted_at = ?2, submission_id = ?3
             WHERE token_sha256 = ?1 AND submitted_at IS NULL AND created_at >= ?4",
            params![token_hash(token), stamp(now), submission_id, self.cutoff(now)],
        )?;
        Ok(changed == 1)
    }

    /// Undoes a claim after the submission could not be written.
    pub fn release(&self, token: &str, submission_id: &str) -> SurveyResult<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE survey_sessions SET submitted_at = NULL, submission_id = NULL
             WHERE token_sha256 = ?1 AND submission_id = ?2",
            params![token_hash(token), submission_id],
        )?;
        Ok(())
    }

    pub fn count_submitted(&self) -> SurveyResult<u64> {
        let conn = self.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM survey_sessions WHERE submitted_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Unsubmitted sessions still on disk, expired or not.
    pub fn count_pending(&self) -> SurveyResult<u64> {
        let conn = self.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM survey_sessions WHERE submitted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}

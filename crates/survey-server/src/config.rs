use std::env;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub max_form_bytes: usize,
    pub index_cache_entries: u64,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            max_form_bytes: 64 * 1024,
            index_cache_entries: 16,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("SURVEY_BIND") {
            if !v.trim().is_empty() {
                cfg.bind = v;
            }
        }
        if let Ok(v) = env::var("SURVEY_MAX_FORM_BYTES") {
            if let Ok(n) = v.parse() {
                cfg.max_form_bytes = n;
            }
        }
        if let Ok(v) = env::var("SURVEY_INDEX_CACHE_ENTRIES") {
            if let Ok(n) = v.parse() {
                cfg.index_cache_entries = n;
            }
        }
        if let Ok(v) = env::var("SURVEY_LOG") {
            cfg.log_level = v;
        }
        cfg
    }
}

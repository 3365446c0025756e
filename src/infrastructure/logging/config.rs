//! Logging configuration (`spec.md` §6 `--jlog`).

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Emit the structured JSON record instead of human text.
    pub jlog: bool,
    /// `host:port` this process is identified by in structured records.
    pub host: String,
    pub level: String,
}

impl LogConfig {
    pub fn new(jlog: bool, host: impl Into<String>) -> Self {
        Self {
            jlog,
            host: host.into(),
            level: "info".to_string(),
        }
    }
}

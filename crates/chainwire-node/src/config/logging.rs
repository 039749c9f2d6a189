use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use super::types::LogLevel;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<PathBuf>,
    pub json: bool,
    /// Extra `EnvFilter` directives appended to the level, e.g. `libp2p_kad=warn`.
    pub directives: Vec<String>,
}

impl LoggingConfig {
    pub fn filter(&self) -> String {
        let mut filter = self.level.to_string();
        for directive in &self.directives {
            filter.push(',');
            filter.push_str(directive);
        }
        filter
    }
}

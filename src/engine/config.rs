//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LexisError, Result};
use crate::lexical::index::config::{PersistentIndexConfig, ScalableIndexConfig};
use crate::lexical::query::FeedbackConfig;
use crate::spelling::SpellingConfig;

/// Which index implementation backs the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Everything in memory, lost when the engine is dropped.
    #[default]
    InMemory,
    /// A single on-disk dictionary written on finalize.
    Persistent,
    /// On-disk blocks merged into the canonical files as indexing proceeds.
    Scalable,
}

/// Configuration for [`Engine`](super::Engine).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use lexis::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{"index": "scalable", "kgram_size": 3}"#).unwrap();
/// assert_eq!(config.kgram_size, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of the k-grams used for wildcards and spelling correction.
    pub kgram_size: usize,
    /// Index implementation.
    pub index: IndexKind,
    /// Used when `index` is `persistent`.
    pub persistent: PersistentIndexConfig,
    /// Used when `index` is `scalable`.
    pub scalable: ScalableIndexConfig,
    /// Spelling correction thresholds.
    pub spelling: SpellingConfig,
    /// Relevance feedback weights.
    pub feedback: FeedbackConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            kgram_size: 2,
            index: IndexKind::default(),
            persistent: PersistentIndexConfig::default(),
            scalable: ScalableIndexConfig::default(),
            spelling: SpellingConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.kgram_size == 0 {
            return Err(LexisError::invalid_config("kgram_size must be positive"));
        }
        match self.index {
            IndexKind::InMemory => {}
            IndexKind::Persistent => self.persistent.validate()?,
            IndexKind::Scalable => self.scalable.validate()?,
        }
        self.spelling.validate()?;
        self.feedback.validate()
    }
}

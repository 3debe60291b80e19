//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Target chunk size in characters for document splitting.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap in characters carried between adjacent chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Number of chunks returned per retrieval call.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Default sampling temperature for model calls.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_search_limit() -> usize {
    5
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            search_limit: default_search_limit(),
            temperature: default_temperature(),
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Recognized variables: `APPFLOW_CHUNK_SIZE`, `APPFLOW_CHUNK_OVERLAP`,
    /// `APPFLOW_SEARCH_LIMIT`, `APPFLOW_TEMPERATURE`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse("APPFLOW_CHUNK_SIZE") {
            config.chunk_size = v;
        }
        if let Some(v) = env_parse("APPFLOW_CHUNK_OVERLAP") {
            config.chunk_overlap = v;
        }
        if let Some(v) = env_parse("APPFLOW_SEARCH_LIMIT") {
            config.search_limit = v;
        }
        if let Some(v) = env_parse::<f32>("APPFLOW_TEMPERATURE") {
            config.temperature = v;
        }
        config
    }

    /// Sets the chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the chunk overlap.
    #[must_use]
    pub fn with_chunk_overlap(mut self, overlap: usize) -> Self {
        self.chunk_overlap = overlap;
        self
    }

    /// Sets the retrieval limit.
    #[must_use]
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Sets the default temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.search_limit, 5);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_builder_setters() {
        let config = EngineConfig::new()
            .with_chunk_size(500)
            .with_chunk_overlap(50)
            .with_search_limit(3)
            .with_temperature(0.7);

        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.search_limit, 3);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let config: EngineConfig = serde_json::from_str("{\"chunk_size\": 256}").unwrap();
        assert_eq!(config.chunk_size, 256);
        assert_eq!(config.chunk_overlap, 200);
    }
}

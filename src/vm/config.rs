//! CPU configuration

use serde::{Deserialize, Serialize};

/// Resource limits for a single virtual CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Depth of each stack; pushing onto a full stack drops the oldest value
    pub stack_depth: usize,
    /// Largest working buffer an allocation may produce
    pub max_working_len: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            stack_depth: 10,
            max_working_len: 1 << 16,
        }
    }
}

impl CpuConfig {
    /// No practical limits (for tests and trusted genomes)
    pub fn unbounded() -> Self {
        Self {
            stack_depth: usize::MAX,
            max_working_len: usize::MAX,
        }
    }

    pub fn with_stack_depth(mut self, depth: usize) -> Self {
        self.stack_depth = depth;
        self
    }

    pub fn with_max_working_len(mut self, len: usize) -> Self {
        self.max_working_len = len;
        self
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CpuConfig::from_json(r#"{ "stack_depth": 4 }"#).unwrap();
        assert_eq!(config.stack_depth, 4);
        assert_eq!(config.max_working_len, CpuConfig::default().max_working_len);
    }

    #[test]
    fn test_builders() {
        let config = CpuConfig::default().with_stack_depth(2).with_max_working_len(64);
        assert_eq!(config, CpuConfig { stack_depth: 2, max_working_len: 64 });
    }
}

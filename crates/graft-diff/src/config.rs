use serde::{Deserialize, Serialize};

/// Configuration for building and diffing visit trees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Consult member override flags while combining diffs.
    pub use_override_mode: bool,
    /// Deepest nesting accepted by the node builder before the graph is
    /// rejected as invalid.
    pub max_depth: usize,
    /// Minimum matcher ratio for two unidentified list items at the same
    /// spot of a replaced run to be treated as one edited item.
    pub match_threshold: f64,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            use_override_mode: false,
            max_depth: 256,
            match_threshold: 0.5,
        }
    }
}

impl DiffConfig {
    /// Default configuration with override flags honoured.
    pub fn override_mode() -> Self {
        Self {
            use_override_mode: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DiffConfig::default();
        assert!(!config.use_override_mode);
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.match_threshold, 0.5);
        assert!(DiffConfig::override_mode().use_override_mode);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: DiffConfig = serde_json::from_str(r#"{"use_override_mode": true}"#).unwrap();
        assert_eq!(config, DiffConfig::override_mode());
    }

    #[test]
    fn serde_roundtrip() {
        let config = DiffConfig {
            max_depth: 8,
            ..DiffConfig::override_mode()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DiffConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}

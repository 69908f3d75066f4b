//! Analysis configuration.

use crate::types::AnalysisError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default maximum combined trace length.
pub const DEFAULT_MAX_TRACE_LENGTH: u32 = 8;
/// Default per-function recomputation budget within one component.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Configuration for one analysis run.
///
/// Passed explicitly to the engine, never read from ambient state, so
/// concurrent runs with different budgets cannot interfere.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Maximum combined source+sink trace length for a reportable issue.
    pub max_trace_length: u32,
    /// Recomputation budget per function within one strongly-connected
    /// component. Tripping it aborts the run with a fatal error.
    pub max_iterations: usize,
    /// Solve independent components of one dependency level in parallel.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_trace_length: DEFAULT_MAX_TRACE_LENGTH,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// A default configuration with the given trace-length budget.
    #[must_use]
    pub fn with_max_trace_length(max_trace_length: u32) -> Self {
        Self {
            max_trace_length,
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// Settings live under a `[taintrace]` table; absent keys keep their
    /// defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, AnalysisError> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        Ok(file.taintrace)
    }

    /// Loads a configuration file from disk.
    pub fn load_from_path(path: &Path) -> Result<Self, AnalysisError> {
        let text = fs::read_to_string(path).map_err(|e| {
            AnalysisError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}

/// Top-level configuration file shape.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    taintrace: AnalysisConfig,
}

//! Analysis configuration.
//!
//! Every field has a default, so a TOML file only needs to name what it
//! changes:
//!
//! ```toml
//! seed = 7
//! cutoff = 2
//! do_gcp = false
//! ```

use crate::error::AnalysisError;
use crate::lattice::widening::{DEFAULT_CUTOFF, DEFAULT_FUN_CUTOFF, MAX_WORKLIST_ITERATIONS};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Worklist draw rotation.
    pub seed: u64,
    /// Pops allowed per drain before the run is declared divergent.
    pub max_iterations: usize,
    /// Struct nesting depth per allocation site.
    pub cutoff: usize,
    /// Nesting depth of functions returning themselves.
    pub fun_cutoff: usize,
    pub do_hm: bool,
    pub do_gcp: bool,
    /// Re-evaluate every node after each drain and fail on a stale one.
    pub check_quiescence: bool,
    pub collect_diagnostics: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            max_iterations: MAX_WORKLIST_ITERATIONS,
            cutoff: DEFAULT_CUTOFF,
            fun_cutoff: DEFAULT_FUN_CUTOFF,
            do_hm: true,
            do_gcp: true,
            check_quiescence: true,
            collect_diagnostics: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, AnalysisError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_hm(mut self, on: bool) -> Self {
        self.do_hm = on;
        self
    }

    pub fn with_gcp(mut self, on: bool) -> Self {
        self.do_gcp = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AnalysisConfig::from_toml_str("").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = AnalysisConfig::from_toml_str("seed = 7\ncutoff = 2\ndo_gcp = false\n").unwrap();
        assert_eq!(
            config,
            AnalysisConfig {
                seed: 7,
                cutoff: 2,
                do_gcp: false,
                ..AnalysisConfig::default()
            }
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = AnalysisConfig::from_toml_str("sede = 7").unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisConfig::from_file("/nonexistent/hm_gcp.toml").unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}

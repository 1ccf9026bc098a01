//! Ratsnest engine settings

use serde::{Deserialize, Serialize};

/// Tunables for recalculation, loadable alongside a board description
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatsnestSettings {
    /// Minimum number of dirty nets before recalculation fans out over rayon
    pub parallel_threshold: usize,
    /// Upper bound on endpoint substitution rounds per ratsnest edge
    pub max_substitution_rounds: usize,
}

impl Default for RatsnestSettings {
    fn default() -> Self {
        Self {
            parallel_threshold: 2,
            max_substitution_rounds: 16,
        }
    }
}

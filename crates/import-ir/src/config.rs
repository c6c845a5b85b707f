use serde::{Deserialize, Serialize};

/// Options of one import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Upper bound on inference passes before the graph is declared
    /// inconsistent. A pass that folds an operand into an attribute schedules
    /// one more pass.
    pub max_passes: usize,
    /// Fail the import when any framework node could not be extracted,
    /// instead of deferring the failure to inference.
    pub strict_extraction: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_passes: 8,
            strict_extraction: false,
        }
    }
}

impl ImportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of inference passes.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set strict extraction.
    pub fn with_strict_extraction(mut self, strict_extraction: bool) -> Self {
        self.strict_extraction = strict_extraction;
        self
    }
}

use serde::{Deserialize, Serialize};

/// Word-rate timing bounds for streaming responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatTimingConfig {
    /// Floor applied to the accumulated streaming time.
    pub min_total_time_ms: u64,
    /// Cap on a single gap between two updates.
    pub max_update_gap_ms: u64,
}

impl Default for ChatTimingConfig {
    fn default() -> Self {
        Self {
            min_total_time_ms: 250,
            max_update_gap_ms: 500,
        }
    }
}

use crate::kernel::services::ports::Settings;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadCoverageDetails {
        path: String,
        test: Option<String>,
    },
    SaveSettings(Settings),
}

use super::*;
use crate::kernel::coverage::CoverageSortOrder;
use crate::kernel::services::adapters::load_settings;
use crate::kernel::services::ports::Settings;
use tempfile::tempdir;

#[test]
fn save_settings_effect_writes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("setting.json");
    let runner = EffectRunner::new().with_settings_path(&path);

    let mut settings = Settings::default();
    settings.coverage.sort_order = CoverageSortOrder::Name;
    runner.run(Effect::SaveSettings(settings.clone()));

    assert_eq!(load_settings(&path).unwrap(), settings);
}

#[test]
fn effects_without_adapter_are_skipped() {
    let runner = EffectRunner::new();
    runner.run_all([
        Effect::LoadCoverageDetails {
            path: "a.rs".to_string(),
            test: None,
        },
        Effect::SaveSettings(Settings::default()),
    ]);
}

use std::path::PathBuf;

use super::coverage::CoverageDetailsLoader;
use super::settings::save_settings;
use crate::kernel::Effect;

/// Routes store effects to the adapter that carries them out.
#[derive(Default)]
pub struct EffectRunner {
    coverage: Option<CoverageDetailsLoader>,
    settings_path: Option<PathBuf>,
}

impl EffectRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coverage_loader(mut self, loader: CoverageDetailsLoader) -> Self {
        self.coverage = Some(loader);
        self
    }

    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn run(&self, effect: Effect) {
        match &effect {
            Effect::LoadCoverageDetails { path, .. } => match &self.coverage {
                Some(loader) => {
                    loader.run(&effect);
                }
                None => tracing::debug!(path = %path, "no coverage provider, skipping details"),
            },
            Effect::SaveSettings(settings) => {
                let Some(path) = &self.settings_path else {
                    return;
                };
                if let Err(e) = save_settings(path, settings) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to save settings");
                }
            }
        }
    }

    pub fn run_all(&self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            self.run(effect);
        }
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/effects.rs"]
mod tests;

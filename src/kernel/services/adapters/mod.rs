//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod coverage;
pub mod effects;
pub mod executor;
pub mod settings;

pub use coverage::CoverageDetailsLoader;
pub use effects::EffectRunner;
pub use executor::TokioExecutor;
pub use settings::{ensure_settings_file, get_settings_path, load_settings, save_settings};

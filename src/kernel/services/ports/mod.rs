//! Service ports: traits + data contracts.

pub mod clock;
pub mod config;
pub mod coverage;
pub mod runtime;
pub mod settings;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ChatTimingConfig;
pub use coverage::{CoverageDetailsProvider, CoverageError};
pub use runtime::{AsyncExecutor, BoxFuture, BoxResultFuture};
pub use settings::{CoverageSettings, Settings, SettingsError};

use std::sync::Arc;

use crate::kernel::services::ports::CoverageDetailsProvider;
use crate::kernel::services::KernelServiceContext;
use crate::kernel::{Action, Effect};

/// Runs detail fetches in the background and feeds results back as
/// `Action::CoverageDetailsLoaded`.
pub struct CoverageDetailsLoader {
    provider: Arc<dyn CoverageDetailsProvider>,
    ctx: KernelServiceContext,
}

impl CoverageDetailsLoader {
    pub fn new(provider: Arc<dyn CoverageDetailsProvider>, ctx: KernelServiceContext) -> Self {
        Self { provider, ctx }
    }

    /// Returns false for effects this loader does not handle.
    pub fn run(&self, effect: &Effect) -> bool {
        let Effect::LoadCoverageDetails { path, test } = effect else {
            return false;
        };

        let fetch = self.provider.details(path, test.as_deref());
        let ctx = self.ctx.clone();
        let path = path.clone();
        let test = test.clone();
        self.ctx.spawn(Box::pin(async move {
            match fetch.await {
                Ok(details) => {
                    tracing::debug!(path = %path, count = details.len(), "coverage details loaded");
                    ctx.dispatch(Action::CoverageDetailsLoaded {
                        path,
                        test,
                        details,
                    });
                }
                Err(e) => {
                    // the node stays in its loading state
                    tracing::warn!(path = %path, error = %e, "coverage details fetch failed");
                }
            }
        }));
        true
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/coverage.rs"]
mod tests;

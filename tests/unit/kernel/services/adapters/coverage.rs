use super::*;
use std::time::Duration;

use crate::kernel::coverage::{CoverageDetail, Location, Position, StatementCoverage};
use crate::kernel::services::adapters::TokioExecutor;
use crate::kernel::services::ports::{BoxResultFuture, CoverageError};
use crate::kernel::services::{KernelMessage, KernelServiceHost};

struct FixedProvider;

impl CoverageDetailsProvider for FixedProvider {
    fn details(
        &self,
        path: &str,
        test: Option<&str>,
    ) -> BoxResultFuture<Vec<CoverageDetail>, CoverageError> {
        let path = path.to_string();
        let filtered = test.is_some();
        Box::pin(async move {
            if path == "missing.rs" {
                return Err(CoverageError::UnknownFile(path));
            }
            let count = if filtered { 0 } else { 1 };
            Ok(vec![CoverageDetail::Statement(StatementCoverage {
                count,
                location: Location::Position(Position::new(1, 0)),
                branches: Vec::new(),
            })])
        })
    }
}

fn host() -> KernelServiceHost {
    KernelServiceHost::new(Arc::new(TokioExecutor::new().unwrap()))
}

#[test]
fn loaded_details_come_back_as_action() {
    let mut host = host();
    let loader = CoverageDetailsLoader::new(Arc::new(FixedProvider), host.context());

    assert!(loader.run(&Effect::LoadCoverageDetails {
        path: "a.rs".to_string(),
        test: Some("t1".to_string()),
    }));

    let KernelMessage::Action(action) = host.recv_timeout(Duration::from_secs(5)).unwrap();
    match action {
        Action::CoverageDetailsLoaded {
            path,
            test,
            details,
        } => {
            assert_eq!(path, "a.rs");
            assert_eq!(test.as_deref(), Some("t1"));
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].count(), 0);
        }
        other => panic!("unexpected action: {other:?}"),
    }
}

#[test]
fn failed_fetch_sends_nothing() {
    let mut host = host();
    let loader = CoverageDetailsLoader::new(Arc::new(FixedProvider), host.context());

    assert!(loader.run(&Effect::LoadCoverageDetails {
        path: "missing.rs".to_string(),
        test: None,
    }));
    assert!(host.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn other_effects_are_not_handled() {
    let host = host();
    let loader = CoverageDetailsLoader::new(Arc::new(FixedProvider), host.context());
    assert!(!loader.run(&Effect::SaveSettings(Default::default())));
}

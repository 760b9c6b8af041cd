use super::*;

#[test]
fn init_writes_into_requested_dir() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    // Another test in this binary may already own the global subscriber.
    let Some(guard) = init(&log_dir) else {
        return;
    };
    assert_eq!(guard.log_dir(), log_dir.as_path());

    tracing::info!(target: "zview", "hello from test");
    drop(guard);

    let names: Vec<String> = std::fs::read_dir(&log_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.starts_with(LOG_FILE_PREFIX)));
}

#[test]
fn init_reports_uncreatable_dir() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("not_a_dir");
    std::fs::write(&file, "x").unwrap();
    assert!(init(file.join("logs")).is_none());
}

use super::*;

fn file(path: &str, covered: u32, total: u32) -> FileCoverage {
    FileCoverage::new(path, CoverageCount::new(covered, total))
}

#[test]
fn append_builds_path_chain() {
    let mut coverage = TestCoverage::new();
    let chain = coverage.append(file("src/lib/a.rs", 1, 2));

    assert_eq!(chain.len(), 4);
    assert_eq!(chain[0], coverage.root());
    assert_eq!(coverage.segment(chain[1]), Some("src"));
    assert_eq!(coverage.value(chain[2]).unwrap().path, "src/lib");
    assert!(coverage.value(chain[3]).unwrap().is_file);
    assert_eq!(coverage.node_for_path("src/lib/a.rs"), Some(chain[3]));
    assert_eq!(coverage.chain(chain[3]), chain);
}

#[test]
fn directories_aggregate_children() {
    let mut coverage = TestCoverage::new();
    coverage.append(file("src/a.rs", 1, 2));
    coverage.append(file("src/b.rs", 3, 4).with_branches(CoverageCount::new(1, 1)));

    let src = coverage.node_for_path("src").unwrap();
    let value = coverage.value(src).unwrap();
    assert!(!value.is_file);
    assert_eq!(value.statement, CoverageCount::new(4, 6));
    assert_eq!(value.branch, Some(CoverageCount::new(1, 1)));
    assert_eq!(coverage.child_count(src), 2);
}

#[test]
fn append_replaces_existing_file() {
    let mut coverage = TestCoverage::new();
    coverage.append(file("a.rs", 0, 2));
    let first = coverage.node_for_path("a.rs").unwrap();
    let chain = coverage.append(file("a.rs", 2, 2));

    assert_eq!(chain.last().copied(), Some(first));
    assert_eq!(coverage.value(first).unwrap().statement, CoverageCount::new(2, 2));
    assert_eq!(coverage.value(coverage.root()).unwrap().statement, CoverageCount::new(2, 2));
}

#[test]
fn empty_path_is_ignored() {
    let mut coverage = TestCoverage::new();
    assert!(coverage.append(file("/", 1, 1)).is_empty());
    assert!(coverage.is_empty());
}

#[test]
fn filter_for_test_keeps_only_contributing_files() {
    let mut coverage = TestCoverage::new();
    coverage.append(file("a.ts", 1, 1).with_tests(["T1", "T2"]));
    coverage.append(file("lib/b.ts", 1, 2).with_tests(["T2"]));

    let filtered = coverage.filter_for_test("T1");
    let paths: Vec<&str> = filtered.files().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a.ts"]);

    // the source is untouched
    assert_eq!(coverage.files().count(), 2);
    assert!(coverage.node_for_path("lib/b.ts").is_some());
}

use super::*;
use crate::kernel::coverage::model::{
    CoverageCount, DeclarationCoverage, FileCoverage, Location, Position, Range,
    StatementCoverage,
};

fn file(path: &str, covered: u32, total: u32) -> FileCoverage {
    FileCoverage::new(path, CoverageCount::new(covered, total))
}

fn labels(state: &CoverageTreeState, parent: Option<ElementKey>) -> Vec<String> {
    state
        .tree()
        .children(parent)
        .iter()
        .map(|k| state.tree().element(*k).unwrap().label().to_string())
        .collect()
}

fn decl(name: &str, start: u32, end: u32, count: u32) -> CoverageDetail {
    CoverageDetail::Declaration(DeclarationCoverage {
        name: name.to_string(),
        count,
        location: Location::Range(Range::lines(start, end)),
    })
}

fn stmts(from: u32, covered: u32, total: u32) -> Vec<CoverageDetail> {
    (0..total)
        .map(|i| {
            CoverageDetail::Statement(StatementCoverage {
                count: u32::from(i < covered),
                location: Location::Position(Position::new(from + i, 1)),
                branches: Vec::new(),
            })
        })
        .collect()
}

fn foo_bar_details() -> Vec<CoverageDetail> {
    let mut details = vec![decl("foo", 1, 10, 5)];
    details.extend(stmts(2, 3, 5));
    details.push(decl("bar", 11, 20, 1));
    details.extend(stmts(12, 2, 2));
    details
}

fn loaded_file_state(order: CoverageSortOrder) -> (CoverageTreeState, ElementKey) {
    let source = TestCoverage::from_files([
        file("f.ts", 5, 7).with_declarations(CoverageCount::new(2, 2))
    ]);
    let mut state = CoverageTreeState::new(order);
    state.set_input(&source);
    let key = state.key_for_path("f.ts").unwrap();
    let (_, effects) = state.expand(key);
    assert_eq!(effects.len(), 1);
    assert!(state.details_loaded("f.ts", None, &foo_bar_details()));
    (state, key)
}

#[test]
fn single_child_directories_are_compressed() {
    let source = TestCoverage::from_files([
        file("src/lib/a.rs", 1, 1),
        file("src/lib/b.rs", 1, 2),
        file("README.md", 0, 0),
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    assert!(state.set_input(&source));

    assert_eq!(labels(&state, None), vec!["README.md", "src/lib"]);
    let lib = state.key_for_path("src/lib").unwrap();
    assert_eq!(labels(&state, Some(lib)), vec!["a.rs", "b.rs"]);
    assert!(state.tree().is_collapsed(lib));
    assert!(state.key_for_path("src").is_none());
}

#[test]
fn filter_prepends_pseudo_node() {
    let source = TestCoverage::from_files([
        file("a.ts", 1, 1).with_tests(["T1"]),
        file("lib/b.ts", 1, 2).with_tests(["T2"]),
        file("lib/c.ts", 1, 2).with_tests(["T2"]),
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    assert!(state.set_filter(&source, Some(CoverageFilter::new("T1", "T1"))));

    assert_eq!(
        labels(&state, None),
        vec!["Currently filtered to \"T1\"".to_string(), "a.ts".to_string()]
    );
    let first = state.tree().children(None)[0];
    assert!(matches!(
        state.tree().element(first),
        Some(TreeElement::Filter(_))
    ));

    assert!(!state.set_filter(&source, Some(CoverageFilter::new("T1", "T1"))));
    assert!(state.set_filter(&source, None));
    assert_eq!(labels(&state, None), vec!["a.ts", "lib"]);
}

#[test]
fn filter_stays_first_across_sort_orders() {
    let source = TestCoverage::from_files([
        file("a.ts", 0, 4).with_tests(["T1"]),
        file("b.ts", 4, 4).with_tests(["T1"]),
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_filter(&source, Some(CoverageFilter::new("T1", "T1")));
    state.set_sort_order(CoverageSortOrder::Coverage);

    let labels = labels(&state, None);
    assert!(labels[0].starts_with("Currently filtered to"));
    assert_eq!(&labels[1..], &["b.ts".to_string(), "a.ts".to_string()]);
}

#[test]
fn expand_shows_loading_then_declarations() {
    let source = TestCoverage::from_files([
        file("f.ts", 1, 2).with_declarations(CoverageCount::new(1, 3))
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let key = state.key_for_path("f.ts").unwrap();
    assert!(state.tree().is_collapsed(key));

    let (changed, effects) = state.expand(key);
    assert!(changed);
    assert_eq!(
        effects,
        vec![Effect::LoadCoverageDetails {
            path: "f.ts".to_string(),
            test: None,
        }]
    );
    assert_eq!(labels(&state, Some(key)), vec!["Loading Coverage Details..."]);
    assert_eq!(state.tree().load_state(key), Some(LoadState::Loading));

    // a second expand while loading does not refetch
    let (_, effects) = state.expand(key);
    assert!(effects.is_empty());

    let details = vec![decl("a", 1, 30, 1), decl("b", 2, 20, 1), decl("c", 3, 10, 1)];
    assert!(state.details_loaded("f.ts", None, &details));
    assert_eq!(state.tree().load_state(key), Some(LoadState::Loaded));

    assert_eq!(labels(&state, Some(key)), vec!["a"]);
    let a = state.tree().children(Some(key))[0];
    assert_eq!(labels(&state, Some(a)), vec!["b"]);
    let b = state.tree().children(Some(a))[0];
    assert_eq!(labels(&state, Some(b)), vec!["c"]);
    let c = state.tree().children(Some(b))[0];
    assert!(state.tree().is_leaf(c));
}

#[test]
fn filtered_expand_requests_test_details() {
    let source = TestCoverage::from_files([file("f.ts", 1, 2)
        .with_declarations(CoverageCount::new(1, 1))
        .with_tests(["T1"])]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_filter(&source, Some(CoverageFilter::new("T1", "first test")));
    let key = state.key_for_path("f.ts").unwrap();

    let (_, effects) = state.expand(key);
    assert_eq!(
        effects,
        vec![Effect::LoadCoverageDetails {
            path: "f.ts".to_string(),
            test: Some("T1".to_string()),
        }]
    );
}

#[test]
fn files_without_declarations_are_leaves() {
    let source = TestCoverage::from_files([file("plain.ts", 1, 2)]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let key = state.key_for_path("plain.ts").unwrap();
    assert!(state.tree().is_leaf(key));
    let (changed, effects) = state.expand(key);
    assert!(!changed);
    assert!(effects.is_empty());
}

#[test]
fn details_for_removed_node_are_dropped() {
    let source = TestCoverage::from_files([
        file("f.ts", 1, 2).with_declarations(CoverageCount::new(1, 1))
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let key = state.key_for_path("f.ts").unwrap();
    state.expand(key);

    state.set_input(&TestCoverage::new());
    assert!(!state.details_loaded("f.ts", None, &[decl("a", 1, 2, 1)]));
    assert!(state.tree().is_empty());
}

#[test]
fn details_without_pending_load_are_dropped() {
    let source = TestCoverage::from_files([
        file("f.ts", 1, 2).with_declarations(CoverageCount::new(1, 1))
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    assert!(!state.details_loaded("f.ts", None, &[decl("a", 1, 2, 1)]));
}

#[test]
fn empty_details_turn_file_into_leaf() {
    let source = TestCoverage::from_files([
        file("f.ts", 1, 2).with_declarations(CoverageCount::new(1, 1))
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let key = state.key_for_path("f.ts").unwrap();
    state.expand(key);
    assert!(state.details_loaded("f.ts", None, &stmts(1, 1, 1)));
    assert!(state.tree().is_leaf(key));
    assert!(state.tree().children(Some(key)).is_empty());
}

#[test]
fn sort_by_coverage_then_location_for_declarations() {
    let (mut state, key) = loaded_file_state(CoverageSortOrder::Location);
    assert_eq!(labels(&state, Some(key)), vec!["foo", "bar"]);

    let before: Vec<ElementKey> = state.tree().children(Some(key)).to_vec();
    assert!(state.set_sort_order(CoverageSortOrder::Coverage));
    assert_eq!(labels(&state, Some(key)), vec!["bar", "foo"]);

    assert!(state.set_sort_order(CoverageSortOrder::Name));
    assert_eq!(labels(&state, Some(key)), vec!["bar", "foo"]);

    assert!(state.set_sort_order(CoverageSortOrder::Location));
    assert_eq!(state.tree().children(Some(key)), before.as_slice());
    assert!(!state.set_sort_order(CoverageSortOrder::Location));
}

#[test]
fn details_are_sorted_with_current_order() {
    let (state, key) = loaded_file_state(CoverageSortOrder::Coverage);
    assert_eq!(labels(&state, Some(key)), vec!["bar", "foo"]);
}

#[test]
fn nodes_added_preserves_unaffected_identities() {
    let mut source = TestCoverage::from_files([
        file("a/x.rs", 1, 1),
        file("a/y.rs", 1, 1),
        file("b/z.rs", 1, 1),
        file("b/w.rs", 1, 1),
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);

    let a = state.key_for_path("a").unwrap();
    let ax = state.key_for_path("a/x.rs").unwrap();
    let b = state.key_for_path("b").unwrap();
    let bz = state.key_for_path("b/z.rs").unwrap();
    let bw = state.key_for_path("b/w.rs").unwrap();
    state.expand(b);

    let chain = source.append(file("a/q.rs", 0, 4));
    assert!(state.nodes_added(&source, &chain));

    assert_eq!(state.key_for_path("a"), Some(a));
    assert_eq!(state.key_for_path("a/x.rs"), Some(ax));
    assert_eq!(state.key_for_path("b"), Some(b));
    assert_eq!(state.key_for_path("b/z.rs"), Some(bz));
    assert_eq!(state.key_for_path("b/w.rs"), Some(bw));
    assert!(!state.tree().is_collapsed(b));
    assert_eq!(labels(&state, Some(a)), vec!["q.rs", "x.rs", "y.rs"]);

    // ancestors show refreshed statistics
    let Some(TreeElement::File(a_el)) = state.tree().element(a) else {
        panic!("expected a file element");
    };
    assert_eq!(a_el.value.statement, CoverageCount::new(2, 6));
}

#[test]
fn nodes_added_at_top_level_rebuilds_roots_in_place() {
    let mut source = TestCoverage::from_files([file("a/x.rs", 1, 1), file("a/y.rs", 1, 1)]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let a = state.key_for_path("a").unwrap();
    let ay = state.key_for_path("a/y.rs").unwrap();

    let chain = source.append(file("c.rs", 1, 1));
    assert!(state.nodes_added(&source, &chain));
    assert_eq!(labels(&state, None), vec!["a", "c.rs"]);
    assert_eq!(state.key_for_path("a"), Some(a));
    assert_eq!(state.key_for_path("a/y.rs"), Some(ay));
}

#[test]
fn nodes_added_splits_a_compressed_chain() {
    let mut source = TestCoverage::from_files([file("src/lib/a.rs", 1, 1)]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    assert_eq!(labels(&state, None), vec!["src/lib/a.rs"]);

    let chain = source.append(file("src/main.rs", 1, 1));
    assert!(state.nodes_added(&source, &chain));
    assert_eq!(labels(&state, None), vec!["src"]);
    let src = state.key_for_path("src").unwrap();
    assert_eq!(labels(&state, Some(src)), vec!["lib/a.rs", "main.rs"]);
}

#[test]
fn nodes_added_resets_stale_file_details() {
    let (mut state, key) = loaded_file_state(CoverageSortOrder::Location);
    let mut source = TestCoverage::from_files([
        file("f.ts", 5, 7).with_declarations(CoverageCount::new(2, 2))
    ]);
    let chain = source.append(file("f.ts", 7, 7).with_declarations(CoverageCount::new(2, 2)));

    assert!(state.nodes_added(&source, &chain));
    assert_eq!(state.key_for_path("f.ts"), Some(key));
    assert_eq!(state.tree().load_state(key), Some(LoadState::NotLoaded));
    assert!(state.tree().children(Some(key)).is_empty());

    let (_, effects) = state.expand(key);
    assert_eq!(effects.len(), 1);
}

#[test]
fn filtered_nodes_added_ignores_other_tests() {
    let mut source = TestCoverage::from_files([
        file("a.ts", 1, 1).with_tests(["T1"]),
        file("b.ts", 1, 1).with_tests(["T1"]),
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_filter(&source, Some(CoverageFilter::new("T1", "T1")));
    let a = state.key_for_path("a.ts").unwrap();

    let chain = source.append(file("c.ts", 1, 1).with_tests(["T2"]));
    assert!(state.nodes_added(&source, &chain));
    assert!(state.key_for_path("c.ts").is_none());

    let chain = source.append(file("d.ts", 1, 1).with_tests(["T1"]));
    assert!(state.nodes_added(&source, &chain));
    assert_eq!(labels(&state, None)[1..], ["a.ts", "b.ts", "d.ts"]);
    assert_eq!(state.key_for_path("a.ts"), Some(a));
}

#[test]
fn rows_follow_collapse_state() {
    let source = TestCoverage::from_files([file("a/x.rs", 1, 1), file("a/y.rs", 1, 1)]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let a = state.key_for_path("a").unwrap();

    assert_eq!(state.rows().len(), 1);
    state.toggle(a);
    assert_eq!(state.rows().len(), 3);
    state.toggle(a);
    assert_eq!(state.rows().len(), 1);
}

#[test]
fn filter_change_discards_details_of_previous_filter() {
    let source = TestCoverage::from_files([file("f.ts", 5, 7)
        .with_declarations(CoverageCount::new(2, 2))
        .with_tests(["T1"])]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let key = state.key_for_path("f.ts").unwrap();
    state.expand(key);
    assert!(state.details_loaded("f.ts", None, &foo_bar_details()));

    assert!(state.set_filter(&source, Some(CoverageFilter::new("T1", "first test"))));
    assert_eq!(state.key_for_path("f.ts"), Some(key));
    assert_eq!(state.tree().load_state(key), Some(LoadState::NotLoaded));
    assert!(state.tree().children(Some(key)).is_empty());
    assert!(state.tree().is_collapsed(key));
    assert!(!state.tree().is_leaf(key));

    let (_, effects) = state.expand(key);
    assert_eq!(
        effects,
        vec![Effect::LoadCoverageDetails {
            path: "f.ts".to_string(),
            test: Some("T1".to_string()),
        }]
    );
    assert!(state.details_loaded("f.ts", Some("T1"), &foo_bar_details()));
    assert_eq!(labels(&state, Some(key)), vec!["foo", "bar"]);
}

#[test]
fn in_flight_details_for_old_filter_are_dropped() {
    let source = TestCoverage::from_files([file("f.ts", 5, 7)
        .with_declarations(CoverageCount::new(2, 2))
        .with_tests(["T1"])]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let key = state.key_for_path("f.ts").unwrap();
    state.expand(key);
    assert_eq!(state.tree().load_state(key), Some(LoadState::Loading));

    state.set_filter(&source, Some(CoverageFilter::new("T1", "first test")));
    assert!(!state.details_loaded("f.ts", None, &foo_bar_details()));
    assert_eq!(state.tree().load_state(key), Some(LoadState::NotLoaded));
    assert!(state.tree().children(Some(key)).is_empty());
}

#[test]
fn empty_details_leaf_is_expandable_again_after_filter_change() {
    let source = TestCoverage::from_files([file("f.ts", 1, 2)
        .with_declarations(CoverageCount::new(1, 1))
        .with_tests(["T1"])]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let key = state.key_for_path("f.ts").unwrap();
    state.expand(key);
    assert!(state.details_loaded("f.ts", None, &stmts(1, 1, 1)));
    assert!(state.tree().is_leaf(key));

    state.set_filter(&source, Some(CoverageFilter::new("T1", "first test")));
    assert!(!state.tree().is_leaf(key));
    let (_, effects) = state.expand(key);
    assert_eq!(effects.len(), 1);
}

#[test]
fn duplicate_declaration_records_are_both_displayed() {
    let source = TestCoverage::from_files([
        file("f.ts", 1, 2).with_declarations(CoverageCount::new(1, 1))
    ]);
    let mut state = CoverageTreeState::new(CoverageSortOrder::Location);
    state.set_input(&source);
    let key = state.key_for_path("f.ts").unwrap();
    state.expand(key);
    assert!(state.details_loaded("f.ts", None, &[decl("dup", 1, 5, 1), decl("dup", 1, 5, 1)]));

    assert_eq!(labels(&state, Some(key)), vec!["dup"]);
    let outer = state.tree().children(Some(key))[0];
    assert_eq!(labels(&state, Some(outer)), vec!["dup"]);
}

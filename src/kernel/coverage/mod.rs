//! Test coverage tree: backing forest, displayed projection and the sync
//! between them.

pub mod display;
pub mod element;
pub mod model;
pub mod result;
pub mod sort;
pub mod tree;

pub use display::{DisplayTree, ElementKey, LoadState, TreeItem, TreeRow};
pub use element::{
    build_declaration_tree, AttributableCoverage, DeclarationElement, DeclarationNode, ElementId,
    FileElement, FilterElement, LoadingElement, TreeElement,
};
pub use model::{
    format_percentage, total_coverage_ratio, BranchCoverage, CoverageCount, CoverageDetail,
    DeclarationCoverage, FileCoverage, Location, Position, Range, StatementCoverage,
};
pub use result::{CoverageNodeId, CoverageValue, TestCoverage};
pub use sort::{compare_elements, CoverageSortOrder};
pub use tree::{CoverageFilter, CoverageTreeState};

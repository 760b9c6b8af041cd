//! Elements shown in the coverage tree and the declaration nesting pass.

use std::cell::OnceCell;

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use super::model::{
    total_coverage_ratio, CoverageCount, CoverageDetail, DeclarationCoverage, Location, Position,
    StatementCoverage,
};
use super::result::CoverageValue;

/// Stable identity used to match old and new children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementId {
    File(String),
    /// `occurrence` tells apart records sharing a name and start in one file.
    Declaration {
        path: String,
        name: CompactString,
        start: Position,
        occurrence: u32,
    },
    Loading(String),
    Filter,
}

#[derive(Clone, Debug)]
pub enum TreeElement {
    File(FileElement),
    Declaration(DeclarationElement),
    Loading(LoadingElement),
    Filter(FilterElement),
}

impl TreeElement {
    pub fn id(&self) -> ElementId {
        match self {
            TreeElement::File(f) => ElementId::File(f.value.path.clone()),
            TreeElement::Declaration(d) => ElementId::Declaration {
                path: d.path.clone(),
                name: CompactString::from(d.data.name.as_str()),
                start: d.data.location.start(),
                occurrence: d.occurrence,
            },
            TreeElement::Loading(l) => ElementId::Loading(l.path.clone()),
            TreeElement::Filter(_) => ElementId::Filter,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TreeElement::File(f) => &f.label,
            TreeElement::Declaration(d) => &d.data.name,
            TreeElement::Loading(_) => "Loading Coverage Details...",
            TreeElement::Filter(f) => &f.label,
        }
    }
}

/// A file or (possibly compressed) directory.
#[derive(Clone, Debug)]
pub struct FileElement {
    /// Path relative to the displayed parent; compressed chains join with '/'.
    pub label: CompactString,
    pub value: CoverageValue,
}

impl FileElement {
    pub fn total_ratio(&self) -> f64 {
        self.value.total_ratio()
    }
}

#[derive(Clone, Debug)]
pub struct LoadingElement {
    pub path: String,
}

/// Pseudo-node leading the tree while a test filter is active.
#[derive(Clone, Debug)]
pub struct FilterElement {
    pub test_id: String,
    pub label: String,
}

impl FilterElement {
    pub fn new(test_id: impl Into<String>, test_label: &str) -> Self {
        Self {
            test_id: test_id.into(),
            label: format!("Currently filtered to \"{test_label}\""),
        }
    }
}

/// Statement and branch totals inside one declaration's range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributableCoverage {
    pub statement: CoverageCount,
    pub branch: Option<CoverageCount>,
}

impl AttributableCoverage {
    pub fn ratio(&self) -> f64 {
        total_coverage_ratio(self.statement, self.branch, None)
    }
}

#[derive(Clone, Debug)]
pub struct DeclarationElement {
    pub path: String,
    pub data: DeclarationCoverage,
    occurrence: u32,
    /// Statements whose location falls inside `data.location`. Fixed at
    /// construction; `attributable` is derived from it once.
    statements: Vec<StatementCoverage>,
    attributable: OnceCell<Option<AttributableCoverage>>,
}

impl DeclarationElement {
    pub fn new(path: impl Into<String>, data: DeclarationCoverage, details: &[CoverageDetail]) -> Self {
        let statements = details
            .iter()
            .filter_map(|d| match d {
                CoverageDetail::Statement(s) if data.location.contains(&s.location) => {
                    Some(s.clone())
                }
                _ => None,
            })
            .collect();
        Self {
            path: path.into(),
            data,
            occurrence: 0,
            statements,
            attributable: OnceCell::new(),
        }
    }

    fn with_occurrence(mut self, occurrence: u32) -> Self {
        self.occurrence = occurrence;
        self
    }

    pub fn occurrence(&self) -> u32 {
        self.occurrence
    }

    pub fn hits(&self) -> u32 {
        self.data.count
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.data.location.contains(location)
    }

    pub fn statements(&self) -> &[StatementCoverage] {
        &self.statements
    }

    /// `None` when the declaration has no range or was never executed.
    pub fn attributable_coverage(&self) -> Option<AttributableCoverage> {
        *self.attributable.get_or_init(|| {
            if self.data.location.as_range().is_none() || self.data.count == 0 {
                return None;
            }
            let mut statement = CoverageCount::default();
            let mut branch = CoverageCount::default();
            for s in &self.statements {
                statement.add(CoverageCount::new(u32::from(s.count > 0), 1));
                for b in &s.branches {
                    branch.add(CoverageCount::new(u32::from(b.count > 0), 1));
                }
            }
            Some(AttributableCoverage {
                statement,
                branch: (branch.total > 0).then_some(branch),
            })
        })
    }
}

/// A declaration with the declarations nested inside it.
#[derive(Clone, Debug)]
pub struct DeclarationNode {
    pub element: DeclarationElement,
    pub children: Vec<DeclarationNode>,
}

/// Nests the declaration records of one file. Each candidate descends
/// through the first already-placed declaration that contains it; records
/// nothing contains become top-level. Statement records only feed the
/// per-declaration aggregates.
pub fn build_declaration_tree(path: &str, details: &[CoverageDetail]) -> Vec<DeclarationNode> {
    let mut roots: Vec<DeclarationNode> = Vec::new();
    let mut seen: FxHashMap<(&str, Position), u32> = FxHashMap::default();
    for detail in details {
        let CoverageDetail::Declaration(decl) = detail else {
            continue;
        };
        let slot = seen
            .entry((decl.name.as_str(), decl.location.start()))
            .or_insert(0);
        let occurrence = *slot;
        *slot += 1;
        if occurrence > 0 {
            tracing::debug!(path, name = %decl.name, occurrence, "duplicate declaration record");
        }

        let mut level = &mut roots;
        loop {
            let parent = level.iter().position(|n| n.element.contains(&decl.location));
            match parent {
                Some(idx) => level = &mut level[idx].children,
                None => break,
            }
        }
        level.push(DeclarationNode {
            element: DeclarationElement::new(path, decl.clone(), details)
                .with_occurrence(occurrence),
            children: Vec::new(),
        });
    }
    roots
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/coverage/element.rs"]
mod tests;

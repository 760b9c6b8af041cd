//! Coverage payloads: locations, counts, file summaries and detail records.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            return Self {
                start: end,
                end: start,
            };
        }
        Self { start, end }
    }

    pub fn lines(start_line: u32, end_line: u32) -> Self {
        Self::new(Position::new(start_line, 0), Position::new(end_line, u32::MAX))
    }

    pub fn contains_position(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    pub fn contains_range(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Range(Range),
    Position(Position),
}

impl Location {
    pub fn start(&self) -> Position {
        match self {
            Location::Range(r) => r.start,
            Location::Position(p) => *p,
        }
    }

    pub fn as_range(&self) -> Option<&Range> {
        match self {
            Location::Range(r) => Some(r),
            Location::Position(_) => None,
        }
    }

    /// A bare position contains nothing.
    pub fn contains(&self, other: &Location) -> bool {
        match (self, other) {
            (Location::Range(own), Location::Range(r)) => own.contains_range(r),
            (Location::Range(own), Location::Position(p)) => own.contains_position(*p),
            (Location::Position(_), _) => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCount {
    pub covered: u32,
    pub total: u32,
}

impl CoverageCount {
    pub fn new(covered: u32, total: u32) -> Self {
        Self { covered, total }
    }

    pub fn add(&mut self, other: CoverageCount) {
        self.covered += other.covered;
        self.total += other.total;
    }
}

/// Combined ratio over every present counter. Nothing to cover counts as
/// fully covered.
pub fn total_coverage_ratio(
    statement: CoverageCount,
    branch: Option<CoverageCount>,
    declaration: Option<CoverageCount>,
) -> f64 {
    let mut sum = statement;
    if let Some(b) = branch {
        sum.add(b);
    }
    if let Some(d) = declaration {
        sum.add(d);
    }
    if sum.total == 0 {
        return 1.0;
    }
    f64::from(sum.covered) / f64::from(sum.total)
}

pub fn format_percentage(ratio: f64) -> String {
    let pct = (ratio * 100.0).clamp(0.0, 100.0);
    if pct == 100.0 || pct == 0.0 {
        format!("{pct:.0}%")
    } else {
        format!("{pct:.2}%")
    }
}

pub fn compare_ratio_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Summary for one covered file, as reported by a test run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    pub path: String,
    pub statement: CoverageCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<CoverageCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<CoverageCount>,
    /// Tests that contributed to this file.
    #[serde(default)]
    pub tests: Vec<String>,
}

impl FileCoverage {
    pub fn new(path: impl Into<String>, statement: CoverageCount) -> Self {
        Self {
            path: path.into(),
            statement,
            branch: None,
            declaration: None,
            tests: Vec::new(),
        }
    }

    pub fn with_declarations(mut self, declaration: CoverageCount) -> Self {
        self.declaration = Some(declaration);
        self
    }

    pub fn with_branches(mut self, branch: CoverageCount) -> Self {
        self.branch = Some(branch);
        self
    }

    pub fn with_tests<I, S>(mut self, tests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tests = tests.into_iter().map(Into::into).collect();
        self
    }

    pub fn total_ratio(&self) -> f64 {
        total_coverage_ratio(self.statement, self.branch, self.declaration)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BranchCoverage {
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatementCoverage {
    pub count: u32,
    pub location: Location,
    #[serde(default)]
    pub branches: Vec<BranchCoverage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclarationCoverage {
    pub name: String,
    pub count: u32,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CoverageDetail {
    Statement(StatementCoverage),
    Declaration(DeclarationCoverage),
}

impl CoverageDetail {
    pub fn location(&self) -> &Location {
        match self {
            CoverageDetail::Statement(s) => &s.location,
            CoverageDetail::Declaration(d) => &d.location,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            CoverageDetail::Statement(s) => s.count,
            CoverageDetail::Declaration(d) => d.count,
        }
    }
}

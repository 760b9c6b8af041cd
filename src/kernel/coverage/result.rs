//! 覆盖率结果树：按路径分段的前缀树，目录节点聚合子节点统计

use std::collections::BTreeMap;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use super::model::{total_coverage_ratio, CoverageCount, FileCoverage};

new_key_type! { pub struct CoverageNodeId; }

/// Statistics carried by a forest node. Directories hold the sum of their
/// descendants.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoverageValue {
    pub path: String,
    pub statement: CoverageCount,
    pub branch: Option<CoverageCount>,
    pub declaration: Option<CoverageCount>,
    pub is_file: bool,
}

impl CoverageValue {
    pub fn total_ratio(&self) -> f64 {
        total_coverage_ratio(self.statement, self.branch, self.declaration)
    }

    pub fn has_declarations(&self) -> bool {
        self.is_file && self.declaration.is_some_and(|d| d.total > 0)
    }

    fn from_file(file: &FileCoverage) -> Self {
        Self {
            path: file.path.clone(),
            statement: file.statement,
            branch: file.branch,
            declaration: file.declaration,
            is_file: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    segment: CompactString,
    parent: Option<CoverageNodeId>,
    children: BTreeMap<CompactString, CoverageNodeId>,
    file: Option<FileCoverage>,
    value: CoverageValue,
}

/// The backing forest. Mutated only by whoever owns the test run; the tree
/// view reads it.
#[derive(Debug, Clone)]
pub struct TestCoverage {
    arena: SlotMap<CoverageNodeId, Node>,
    root: CoverageNodeId,
    by_path: FxHashMap<String, CoverageNodeId>,
}

impl Default for TestCoverage {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCoverage {
    pub fn new() -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node {
            segment: CompactString::default(),
            parent: None,
            children: BTreeMap::new(),
            file: None,
            value: CoverageValue::default(),
        });
        Self {
            arena,
            root,
            by_path: FxHashMap::default(),
        }
    }

    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = FileCoverage>,
    {
        let mut coverage = Self::new();
        for file in files {
            coverage.append(file);
        }
        coverage
    }

    pub fn root(&self) -> CoverageNodeId {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.arena[self.root].children.is_empty()
    }

    pub fn contains(&self, id: CoverageNodeId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn parent(&self, id: CoverageNodeId) -> Option<CoverageNodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: CoverageNodeId) -> impl Iterator<Item = CoverageNodeId> + '_ {
        self.arena
            .get(id)
            .into_iter()
            .flat_map(|n| n.children.values().copied())
    }

    pub fn child_count(&self, id: CoverageNodeId) -> usize {
        self.arena.get(id).map(|n| n.children.len()).unwrap_or(0)
    }

    pub fn value(&self, id: CoverageNodeId) -> Option<&CoverageValue> {
        self.arena.get(id).map(|n| &n.value)
    }

    pub fn segment(&self, id: CoverageNodeId) -> Option<&str> {
        self.arena.get(id).map(|n| n.segment.as_str())
    }

    pub fn file(&self, id: CoverageNodeId) -> Option<&FileCoverage> {
        self.arena.get(id).and_then(|n| n.file.as_ref())
    }

    pub fn node_for_path(&self, path: &str) -> Option<CoverageNodeId> {
        self.by_path.get(normalize(path)).copied()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileCoverage> + '_ {
        self.arena.values().filter_map(|n| n.file.as_ref())
    }

    /// Nodes from the root down to `id`, root first.
    pub fn chain(&self, id: CoverageNodeId) -> Vec<CoverageNodeId> {
        let mut chain = Vec::new();
        let mut cur = Some(id);
        while let Some(node) = cur {
            if !self.arena.contains_key(node) {
                break;
            }
            chain.push(node);
            cur = self.arena[node].parent;
        }
        chain.reverse();
        chain
    }

    /// Inserts or replaces a file. Returns every node along its path, root
    /// first; each has been created or had its statistics recomputed.
    pub fn append(&mut self, file: FileCoverage) -> Vec<CoverageNodeId> {
        let path = normalize(&file.path).to_string();
        let mut chain = vec![self.root];
        let mut cur = self.root;
        let mut prefix = String::new();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            let existing = self.arena[cur].children.get(segment).copied();
            let next = match existing {
                Some(id) => id,
                None => {
                    let id = self.arena.insert(Node {
                        segment: CompactString::from(segment),
                        parent: Some(cur),
                        children: BTreeMap::new(),
                        file: None,
                        value: CoverageValue {
                            path: prefix.clone(),
                            ..CoverageValue::default()
                        },
                    });
                    self.arena[cur]
                        .children
                        .insert(CompactString::from(segment), id);
                    self.by_path.insert(prefix.clone(), id);
                    id
                }
            };
            chain.push(next);
            cur = next;
        }

        if cur == self.root {
            tracing::debug!(path = %file.path, "ignoring coverage with empty path");
            return Vec::new();
        }

        let mut file = file;
        file.path = path;
        let leaf = &mut self.arena[cur];
        leaf.value = CoverageValue::from_file(&file);
        leaf.file = Some(file);

        for &id in chain.iter().rev().skip(1) {
            self.recompute(id);
        }
        chain
    }

    fn recompute(&mut self, id: CoverageNodeId) {
        let mut statement = CoverageCount::default();
        let mut branch: Option<CoverageCount> = None;
        let mut declaration: Option<CoverageCount> = None;

        for child in self.arena[id].children.values() {
            let value = &self.arena[*child].value;
            statement.add(value.statement);
            if let Some(b) = value.branch {
                branch.get_or_insert_with(CoverageCount::default).add(b);
            }
            if let Some(d) = value.declaration {
                declaration.get_or_insert_with(CoverageCount::default).add(d);
            }
        }

        let node = &mut self.arena[id];
        node.value.statement = statement;
        node.value.branch = branch;
        node.value.declaration = declaration;
    }

    /// Read-only projection holding only the files `test` contributed to.
    pub fn filter_for_test(&self, test: &str) -> TestCoverage {
        let mut filtered = TestCoverage::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.arena[id];
            if let Some(file) = &node.file {
                if file.tests.iter().any(|t| t == test) {
                    filtered.append(file.clone());
                }
            }
            stack.extend(node.children.values().rev().copied());
        }
        filtered
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/coverage/result.rs"]
mod tests;

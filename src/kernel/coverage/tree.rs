//! 覆盖率树同步：维护显示树，按需加载声明明细，增量修补子节点列表

use super::display::{DisplayTree, ElementKey, LoadState, TreeItem, TreeRow};
use super::element::{
    build_declaration_tree, DeclarationNode, ElementId, FileElement, FilterElement, LoadingElement,
    TreeElement,
};
use super::model::CoverageDetail;
use super::result::{CoverageNodeId, TestCoverage};
use super::sort::{compare_elements, CoverageSortOrder};
use crate::kernel::Effect;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageFilter {
    pub test_id: String,
    pub label: String,
}

impl CoverageFilter {
    pub fn new(test_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            label: label.into(),
        }
    }
}

pub struct CoverageTreeState {
    tree: DisplayTree,
    sort_order: CoverageSortOrder,
    filter: Option<CoverageFilter>,
}

impl CoverageTreeState {
    pub fn new(sort_order: CoverageSortOrder) -> Self {
        Self {
            tree: DisplayTree::new(),
            sort_order,
            filter: None,
        }
    }

    pub fn tree(&self) -> &DisplayTree {
        &self.tree
    }

    pub fn sort_order(&self) -> CoverageSortOrder {
        self.sort_order
    }

    pub fn filter(&self) -> Option<&CoverageFilter> {
        self.filter.as_ref()
    }

    pub fn rows(&self) -> Vec<TreeRow> {
        self.tree.flatten()
    }

    pub fn key_for_path(&self, path: &str) -> Option<ElementKey> {
        self.tree.key_of(&ElementId::File(path.to_string()))
    }

    /// Rebuilds the top level from `source`, reusing every node whose
    /// identity survives.
    pub fn set_input(&mut self, source: &TestCoverage) -> bool {
        let projection = self
            .filter
            .as_ref()
            .map(|f| source.filter_for_test(&f.test_id));
        let items = self.root_items(projection.as_ref().unwrap_or(source));
        self.tree.set_children(None, items);
        true
    }

    pub fn set_filter(&mut self, source: &TestCoverage, filter: Option<CoverageFilter>) -> bool {
        if self.filter == filter {
            return false;
        }
        tracing::debug!(test = ?filter.as_ref().map(|f| &f.test_id), "coverage filter changed");
        self.filter = filter;
        self.reset_loaded_details();
        self.set_input(source)
    }

    /// Details are per test; anything fetched or in flight under the old
    /// filter is discarded and refetched on the next expand.
    fn reset_loaded_details(&mut self) {
        let stale: Vec<(ElementKey, bool)> = self
            .tree
            .keys()
            .filter(|key| {
                !matches!(
                    self.tree.load_state(*key),
                    None | Some(LoadState::NotLoaded)
                )
            })
            .map(|key| {
                let has_declarations = matches!(
                    self.tree.element(key),
                    Some(TreeElement::File(f)) if f.value.has_declarations()
                );
                (key, has_declarations)
            })
            .collect();

        for (key, has_declarations) in stale {
            self.tree.set_children(Some(key), Vec::new());
            self.tree.set_load_state(key, LoadState::NotLoaded);
            self.tree.set_collapsible(key, has_declarations);
            self.tree.set_collapsed(key, true);
        }
    }

    /// Re-sorts the displayed tree in place; nothing is refetched.
    pub fn set_sort_order(&mut self, order: CoverageSortOrder) -> bool {
        if self.sort_order == order {
            return false;
        }
        self.sort_order = order;
        self.tree.resort(|a, b| compare_elements(order, a, b));
        true
    }

    /// Expands a node. Files with declaration data show a loading
    /// placeholder right away and request their details.
    pub fn expand(&mut self, key: ElementKey) -> (bool, Vec<Effect>) {
        if self.tree.is_leaf(key) {
            return (false, Vec::new());
        }
        let mut changed = self.tree.set_collapsed(key, false);

        let path = match self.tree.element(key) {
            Some(TreeElement::File(f)) if f.value.has_declarations() => f.value.path.clone(),
            _ => return (changed, Vec::new()),
        };
        if self.tree.load_state(key) != Some(LoadState::NotLoaded) {
            return (changed, Vec::new());
        }

        self.tree.set_children(
            Some(key),
            vec![TreeItem::leaf(TreeElement::Loading(LoadingElement {
                path: path.clone(),
            }))],
        );
        self.tree.set_load_state(key, LoadState::Loading);
        changed = true;

        let test = self.filter.as_ref().map(|f| f.test_id.clone());
        (changed, vec![Effect::LoadCoverageDetails { path, test }])
    }

    pub fn collapse(&mut self, key: ElementKey) -> bool {
        self.tree.set_collapsed(key, true)
    }

    pub fn toggle(&mut self, key: ElementKey) -> (bool, Vec<Effect>) {
        if self.tree.is_collapsed(key) {
            self.expand(key)
        } else {
            (self.collapse(key), Vec::new())
        }
    }

    /// Applies resolved detail records fetched for `test`. Dropped when the
    /// file is no longer displayed, is not waiting for them, or the filter
    /// has moved to another test since the fetch started.
    pub fn details_loaded(
        &mut self,
        path: &str,
        test: Option<&str>,
        details: &[CoverageDetail],
    ) -> bool {
        let current = self.filter.as_ref().map(|f| f.test_id.as_str());
        if current != test {
            tracing::debug!(path, ?test, ?current, "dropping coverage details for another filter");
            return false;
        }
        let Some(key) = self.key_for_path(path) else {
            tracing::debug!(path, "dropping coverage details for a removed node");
            return false;
        };
        if self.tree.load_state(key) != Some(LoadState::Loading) {
            tracing::debug!(path, "dropping coverage details, node is not loading");
            return false;
        }

        let order = self.sort_order;
        let items = declaration_items(build_declaration_tree(path, details), order);
        if items.is_empty() {
            self.tree.set_children(Some(key), Vec::new());
            self.tree.set_collapsible(key, false);
        } else {
            self.tree.set_children(Some(key), items);
        }
        self.tree.set_load_state(key, LoadState::Loaded);
        true
    }

    /// Reconciles after `chain` (root first, as returned by
    /// `TestCoverage::append`) changed in `source`. Only the deepest
    /// displayed node of the chain gets a new child list; displayed nodes
    /// above it just refresh their statistics.
    pub fn nodes_added(&mut self, source: &TestCoverage, chain: &[CoverageNodeId]) -> bool {
        let Some(leaf_path) = chain
            .last()
            .and_then(|id| source.value(*id))
            .map(|v| v.path.clone())
        else {
            return false;
        };

        let Some(test_id) = self.filter.as_ref().map(|f| f.test_id.clone()) else {
            return self.reconcile(source, chain);
        };

        let projection = source.filter_for_test(&test_id);
        match projection.node_for_path(&leaf_path) {
            Some(leaf) => {
                let chain = projection.chain(leaf);
                self.reconcile(&projection, &chain)
            }
            None => {
                // the file left the filtered set
                let items = self.root_items(&projection);
                self.tree.set_children(None, items);
                true
            }
        }
    }

    fn reconcile(&mut self, forest: &TestCoverage, chain: &[CoverageNodeId]) -> bool {
        let target = chain.iter().rev().copied().find_map(|id| {
            if id == forest.root() {
                return Some((id, None));
            }
            let path = &forest.value(id)?.path;
            self.key_for_path(path).map(|key| (id, Some(key)))
        });
        let Some((target, target_key)) = target else {
            return false;
        };

        for &id in chain {
            if id == target {
                break;
            }
            self.refresh_value(forest, id);
        }

        let Some(key) = target_key else {
            let items = self.root_items(forest);
            self.tree.set_children(None, items);
            return true;
        };

        self.refresh_value(forest, target);
        if forest.child_count(target) > 0 {
            let items = self.child_items(forest, target);
            self.tree.set_children(Some(key), items);
        } else if self.tree.load_state(key) != Some(LoadState::NotLoaded) {
            // the file's details are stale now; fetch again on next expand
            self.tree.set_children(Some(key), Vec::new());
            self.tree.set_load_state(key, LoadState::NotLoaded);
            self.tree.set_collapsed(key, true);
        }
        true
    }

    fn refresh_value(&mut self, forest: &TestCoverage, id: CoverageNodeId) {
        let Some(value) = forest.value(id) else {
            return;
        };
        let Some(key) = self.key_for_path(&value.path) else {
            return;
        };
        let label = match self.tree.element(key) {
            Some(TreeElement::File(f)) => f.label.clone(),
            _ => return,
        };
        let collapsible = forest.child_count(id) > 0 || value.has_declarations();
        self.tree.update_element(
            key,
            TreeElement::File(FileElement {
                label,
                value: value.clone(),
            }),
        );
        if collapsible && self.tree.is_leaf(key) {
            self.tree.set_collapsible(key, true);
            self.tree.set_collapsed(key, true);
        }
    }

    fn root_items(&self, forest: &TestCoverage) -> Vec<TreeItem> {
        let mut items = self.child_items(forest, forest.root());
        if let Some(filter) = &self.filter {
            items.insert(
                0,
                TreeItem::leaf(TreeElement::Filter(FilterElement::new(
                    filter.test_id.clone(),
                    &filter.label,
                ))),
            );
        }
        items
    }

    /// Children as displayed: single-child directory chains are compressed
    /// into one node labelled with the joined segments.
    fn child_items(&self, forest: &TestCoverage, parent: CoverageNodeId) -> Vec<TreeItem> {
        let mut items: Vec<TreeItem> = forest
            .children(parent)
            .filter_map(|child| {
                let mut node = child;
                let mut label = forest.segment(node)?.to_string();
                while forest.child_count(node) == 1 {
                    node = forest.children(node).next()?;
                    label.push('/');
                    label.push_str(forest.segment(node)?);
                }
                let value = forest.value(node)?.clone();
                let has_children = forest.child_count(node) > 0;
                let collapsible = has_children || value.has_declarations();
                Some(TreeItem {
                    element: TreeElement::File(FileElement {
                        label: label.into(),
                        value,
                    }),
                    collapsible,
                    collapsed: !has_children || self.filter.is_none(),
                    children: has_children.then(|| self.child_items(forest, node)),
                })
            })
            .collect();
        let order = self.sort_order;
        items.sort_by(|a, b| compare_elements(order, &a.element, &b.element));
        items
    }
}

fn declaration_items(nodes: Vec<DeclarationNode>, order: CoverageSortOrder) -> Vec<TreeItem> {
    let mut items: Vec<TreeItem> = nodes
        .into_iter()
        .map(|node| {
            let has_children = !node.children.is_empty();
            TreeItem {
                element: TreeElement::Declaration(node.element),
                collapsible: has_children,
                collapsed: false,
                children: Some(declaration_items(node.children, order)),
            }
        })
        .collect();
    items.sort_by(|a, b| compare_elements(order, &a.element, &b.element));
    items
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/coverage/tree.rs"]
mod tests;

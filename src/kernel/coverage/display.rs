//! Displayed projection of the coverage forest.
//!
//! Children are matched by `ElementId` on every update so that nodes that
//! survive keep their key, collapse state and load state.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use super::element::{ElementId, TreeElement};

new_key_type! { pub struct ElementKey; }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
}

/// Input to `set_children`. `children: None` keeps whatever a reused node
/// already shows (lazily loaded children survive a refresh of the parent).
#[derive(Clone, Debug)]
pub struct TreeItem {
    pub element: TreeElement,
    pub collapsible: bool,
    pub collapsed: bool,
    pub children: Option<Vec<TreeItem>>,
}

impl TreeItem {
    pub fn leaf(element: TreeElement) -> Self {
        Self {
            element,
            collapsible: false,
            collapsed: false,
            children: None,
        }
    }
}

#[derive(Debug)]
struct DisplayNode {
    element: TreeElement,
    id: ElementId,
    parent: Option<ElementKey>,
    children: Vec<ElementKey>,
    collapsible: bool,
    collapsed: bool,
    load_state: LoadState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeRow {
    pub key: ElementKey,
    pub depth: usize,
    pub label: String,
    pub is_leaf: bool,
    pub is_collapsed: bool,
}

#[derive(Debug, Default)]
pub struct DisplayTree {
    arena: SlotMap<ElementKey, DisplayNode>,
    roots: Vec<ElementKey>,
    by_id: FxHashMap<ElementId, ElementKey>,
}

impl DisplayTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ElementKey> + '_ {
        self.arena.keys()
    }

    pub fn has_element(&self, id: &ElementId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn key_of(&self, id: &ElementId) -> Option<ElementKey> {
        self.by_id.get(id).copied()
    }

    pub fn element(&self, key: ElementKey) -> Option<&TreeElement> {
        self.arena.get(key).map(|n| &n.element)
    }

    pub fn id(&self, key: ElementKey) -> Option<&ElementId> {
        self.arena.get(key).map(|n| &n.id)
    }

    pub fn parent(&self, key: ElementKey) -> Option<ElementKey> {
        self.arena.get(key).and_then(|n| n.parent)
    }

    /// `None` addresses the top level.
    pub fn children(&self, parent: Option<ElementKey>) -> &[ElementKey] {
        match parent {
            None => &self.roots,
            Some(key) => self
                .arena
                .get(key)
                .map(|n| n.children.as_slice())
                .unwrap_or(&[]),
        }
    }

    pub fn is_leaf(&self, key: ElementKey) -> bool {
        self.arena.get(key).map(|n| !n.collapsible).unwrap_or(true)
    }

    pub fn is_collapsed(&self, key: ElementKey) -> bool {
        self.arena.get(key).map(|n| n.collapsed).unwrap_or(true)
    }

    pub fn load_state(&self, key: ElementKey) -> Option<LoadState> {
        self.arena.get(key).map(|n| n.load_state)
    }

    pub fn set_load_state(&mut self, key: ElementKey, state: LoadState) {
        if let Some(node) = self.arena.get_mut(key) {
            node.load_state = state;
        }
    }

    pub fn set_collapsed(&mut self, key: ElementKey, collapsed: bool) -> bool {
        let Some(node) = self.arena.get_mut(key) else {
            return false;
        };
        if !node.collapsible || node.collapsed == collapsed {
            return false;
        }
        node.collapsed = collapsed;
        true
    }

    pub fn set_collapsible(&mut self, key: ElementKey, collapsible: bool) {
        if let Some(node) = self.arena.get_mut(key) {
            node.collapsible = collapsible;
            if !collapsible {
                node.collapsed = false;
            }
        }
    }

    /// Swaps the payload of a displayed node. The identity must not change.
    pub fn update_element(&mut self, key: ElementKey, element: TreeElement) -> bool {
        let Some(node) = self.arena.get_mut(key) else {
            return false;
        };
        if element.id() != node.id {
            tracing::warn!(?node.id, "update_element called with a different identity");
            return false;
        }
        node.element = element;
        true
    }

    /// Replaces the child list of `parent`, reusing old children whose
    /// identity reappears.
    pub fn set_children(&mut self, parent: Option<ElementKey>, items: Vec<TreeItem>) {
        if let Some(key) = parent {
            if !self.arena.contains_key(key) {
                return;
            }
        }

        let old = match parent {
            None => std::mem::take(&mut self.roots),
            Some(key) => std::mem::take(&mut self.arena[key].children),
        };

        let mut reusable: FxHashMap<ElementId, ElementKey> = FxHashMap::default();
        for key in &old {
            if let Some(node) = self.arena.get(*key) {
                reusable.insert(node.id.clone(), *key);
            }
        }

        let mut plan: Vec<(TreeItem, ElementId, Option<ElementKey>)> = Vec::with_capacity(items.len());
        for item in items {
            let id = item.element.id();
            let reuse = reusable.remove(&id);
            plan.push((item, id, reuse));
        }

        for key in reusable.into_values() {
            self.remove_subtree(key);
        }

        let mut next = Vec::with_capacity(plan.len());
        for (item, id, reuse) in plan {
            let TreeItem {
                element,
                collapsible,
                collapsed,
                children,
            } = item;

            let key = match reuse {
                Some(key) => {
                    let node = &mut self.arena[key];
                    node.element = element;
                    node.collapsible = collapsible;
                    if !collapsible {
                        node.collapsed = false;
                    }
                    key
                }
                None => {
                    // same identity displayed under another parent
                    if let Some(stale) = self.by_id.get(&id).copied() {
                        self.detach(stale);
                        self.remove_subtree(stale);
                    }
                    let key = self.arena.insert(DisplayNode {
                        element,
                        id: id.clone(),
                        parent,
                        children: Vec::new(),
                        collapsible,
                        collapsed: collapsible && collapsed,
                        load_state: LoadState::NotLoaded,
                    });
                    self.by_id.insert(id, key);
                    key
                }
            };

            if let Some(children) = children {
                self.set_children(Some(key), children);
            }
            next.push(key);
        }
        next.retain(|k| self.arena.contains_key(*k));

        match parent {
            None => self.roots = next,
            Some(key) => {
                if let Some(node) = self.arena.get_mut(key) {
                    node.children = next;
                }
            }
        }
    }

    /// Stable re-sort of every sibling list; identities are untouched.
    pub fn resort<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&TreeElement, &TreeElement) -> Ordering,
    {
        let mut roots = std::mem::take(&mut self.roots);
        self.sort_keys(&mut roots, &mut cmp);
        self.roots = roots;

        let keys: Vec<ElementKey> = self.arena.keys().collect();
        for key in keys {
            let mut children = std::mem::take(&mut self.arena[key].children);
            self.sort_keys(&mut children, &mut cmp);
            self.arena[key].children = children;
        }
    }

    fn sort_keys<F>(&self, keys: &mut [ElementKey], cmp: &mut F)
    where
        F: FnMut(&TreeElement, &TreeElement) -> Ordering,
    {
        keys.sort_by(|a, b| cmp(&self.arena[*a].element, &self.arena[*b].element));
    }

    /// Visible rows in display order, skipping collapsed subtrees.
    pub fn flatten(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<(ElementKey, usize)> =
            self.roots.iter().rev().map(|k| (*k, 0)).collect();
        while let Some((key, depth)) = stack.pop() {
            let node = &self.arena[key];
            rows.push(TreeRow {
                key,
                depth,
                label: node.element.label().to_string(),
                is_leaf: !node.collapsible,
                is_collapsed: node.collapsed,
            });
            if node.collapsible && !node.collapsed {
                stack.extend(node.children.iter().rev().map(|k| (*k, depth + 1)));
            }
        }
        rows
    }

    fn detach(&mut self, key: ElementKey) {
        let parent = self.arena.get(key).and_then(|n| n.parent);
        match parent {
            None => self.roots.retain(|k| *k != key),
            Some(p) => {
                if let Some(node) = self.arena.get_mut(p) {
                    node.children.retain(|k| *k != key);
                }
            }
        }
    }

    fn remove_subtree(&mut self, key: ElementKey) {
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.arena.remove(k) {
                if self.by_id.get(&node.id) == Some(&k) {
                    self.by_id.remove(&node.id);
                }
                stack.extend(node.children);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/coverage/display.rs"]
mod tests;

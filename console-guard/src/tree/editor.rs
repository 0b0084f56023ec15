//! PermissionTreeEditor - 权限树编辑
//!
//! Checkbox state over a menu tree, used when granting menus to a role.
//! Only leaves carry state; a parent is checked when all leaves below it are
//! and indeterminate when some are. Every node keeps a count of its checked
//! leaves, so a toggle touches the toggled subtree and its ancestors only.

use serde::{Deserialize, Serialize};
use shared::MenuNode;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::TreeError;

/// Snapshot of the editor state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSelectionState {
    pub checked: BTreeSet<i64>,
    pub indeterminate: BTreeSet<i64>,
    pub expanded: BTreeSet<i64>,
}

/// Payload of a change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckChange {
    /// Fully checked nodes, tree order
    pub checked: Vec<i64>,
    pub half_checked: Vec<i64>,
}

type Listener = Box<dyn FnMut(&CheckChange) + Send>;

/// 权限树编辑器
pub struct PermissionTreeEditor {
    /// Pre-order
    order: Vec<i64>,
    parent: HashMap<i64, i64>,
    children: HashMap<i64, Vec<i64>>,
    leaf_total: HashMap<i64, usize>,
    leaf_checked: HashMap<i64, usize>,
    checked_leaves: HashSet<i64>,
    expanded: HashSet<i64>,
    listeners: Vec<Listener>,
}

impl PermissionTreeEditor {
    /// Index `tree`; node ids must be unique
    pub fn load(tree: &[MenuNode]) -> Result<Self, TreeError> {
        let mut editor = Self {
            order: Vec::new(),
            parent: HashMap::new(),
            children: HashMap::new(),
            leaf_total: HashMap::new(),
            leaf_checked: HashMap::new(),
            checked_leaves: HashSet::new(),
            expanded: HashSet::new(),
            listeners: Vec::new(),
        };
        for node in tree {
            editor.index(node, None)?;
        }
        Ok(editor)
    }

    fn index(&mut self, node: &MenuNode, parent: Option<i64>) -> Result<usize, TreeError> {
        if self.leaf_total.contains_key(&node.id) {
            return Err(TreeError::DuplicateNode(node.id));
        }
        // reserve the id before descending so a repeat below is caught
        self.leaf_total.insert(node.id, 0);
        self.order.push(node.id);
        if let Some(p) = parent {
            self.parent.insert(node.id, p);
        }

        let mut leaves = 0;
        let mut ids = Vec::with_capacity(node.children.len());
        for child in &node.children {
            ids.push(child.id);
            leaves += self.index(child, Some(node.id))?;
        }
        if ids.is_empty() {
            leaves = 1;
        }

        self.children.insert(node.id, ids);
        self.leaf_total.insert(node.id, leaves);
        self.leaf_checked.insert(node.id, 0);
        Ok(leaves)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.leaf_total.contains_key(&id)
    }

    fn is_leaf(&self, id: i64) -> bool {
        self.children.get(&id).is_none_or(|c| c.is_empty())
    }

    pub fn is_checked(&self, id: i64) -> bool {
        match (self.leaf_checked.get(&id), self.leaf_total.get(&id)) {
            (Some(checked), Some(total)) => *total > 0 && checked == total,
            _ => false,
        }
    }

    pub fn is_indeterminate(&self, id: i64) -> bool {
        match (self.leaf_checked.get(&id), self.leaf_total.get(&id)) {
            (Some(checked), Some(total)) => *checked > 0 && checked < total,
            _ => false,
        }
    }

    /// Fully checked nodes in tree order
    pub fn get_checked(&self) -> Vec<i64> {
        self.order.iter().copied().filter(|id| self.is_checked(*id)).collect()
    }

    pub fn get_half_checked(&self) -> Vec<i64> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.is_indeterminate(*id))
            .collect()
    }

    /// Replace the selection without notifying
    ///
    /// Listing a parent checks everything below it. Unknown ids are skipped.
    pub fn set_checked<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = i64>,
    {
        self.reset_checks();
        for id in ids {
            if !self.contains(id) {
                tracing::debug!(id, "Ignoring unknown tree node");
                continue;
            }
            self.set_subtree(id, true);
        }
    }

    /// User toggle: the subtree moves to the opposite of the node's own
    /// checked state, so an indeterminate node becomes fully checked
    pub fn toggle(&mut self, id: i64) -> Result<bool, TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        let target = !self.is_checked(id);
        if self.set_subtree(id, target) {
            self.notify();
        }
        Ok(target)
    }

    pub fn select_all(&mut self) {
        let roots: Vec<i64> = self.roots().collect();
        let mut changed = false;
        for root in roots {
            changed |= self.set_subtree(root, true);
        }
        if changed {
            self.notify();
        }
    }

    pub fn clear_all(&mut self) {
        if self.checked_leaves.is_empty() {
            return;
        }
        self.reset_checks();
        self.notify();
    }

    pub fn expand_all(&mut self) {
        self.expanded = self
            .order
            .iter()
            .copied()
            .filter(|id| !self.is_leaf(*id))
            .collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn toggle_expanded(&mut self, id: i64) -> Result<bool, TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        if self.expanded.remove(&id) {
            Ok(false)
        } else {
            self.expanded.insert(id);
            Ok(true)
        }
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.expanded.contains(&id)
    }

    /// Called after every user-driven change of the checked set
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&CheckChange) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> TreeSelectionState {
        TreeSelectionState {
            checked: self.get_checked().into_iter().collect(),
            indeterminate: self.get_half_checked().into_iter().collect(),
            expanded: self.expanded.iter().copied().collect(),
        }
    }

    fn roots(&self) -> impl Iterator<Item = i64> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|id| !self.parent.contains_key(id))
    }

    fn reset_checks(&mut self) {
        self.checked_leaves.clear();
        for count in self.leaf_checked.values_mut() {
            *count = 0;
        }
    }

    /// Returns whether any leaf changed
    fn set_subtree(&mut self, id: i64, checked: bool) -> bool {
        let mut changed = false;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.is_leaf(current) {
                changed |= self.set_leaf(current, checked);
            } else if let Some(children) = self.children.get(&current) {
                stack.extend(children.iter().copied());
            }
        }
        changed
    }

    fn set_leaf(&mut self, leaf: i64, checked: bool) -> bool {
        let changed = if checked {
            self.checked_leaves.insert(leaf)
        } else {
            self.checked_leaves.remove(&leaf)
        };
        if !changed {
            return false;
        }

        let mut current = Some(leaf);
        while let Some(id) = current {
            if let Some(count) = self.leaf_checked.get_mut(&id) {
                if checked {
                    *count += 1;
                } else {
                    *count = count.saturating_sub(1);
                }
            }
            current = self.parent.get(&id).copied();
        }
        true
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let change = CheckChange {
            checked: self.get_checked(),
            half_checked: self.get_half_checked(),
        };
        for listener in &mut self.listeners {
            listener(&change);
        }
    }
}

impl std::fmt::Debug for PermissionTreeEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionTreeEditor")
            .field("nodes", &self.order.len())
            .field("checked_leaves", &self.checked_leaves.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

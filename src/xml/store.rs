//! Get-or-create primitives used by every formatting accessor.

use super::tree::{NodeId, XmlTree};

/// Get-or-create access to child elements and attributes.
///
/// Formatting setters go through this trait rather than editing the tree
/// directly, so a property element is created at most once per parent.
pub trait PropertyStore {
    /// First child named `name`, appended when missing.
    fn child_or_append(&mut self, node: NodeId, name: &str) -> Option<NodeId>;

    /// First child named `name`; when missing it is inserted before the first
    /// child named `before`, or appended if there is none.
    fn child_or_insert_before(&mut self, node: NodeId, name: &str, before: &str) -> Option<NodeId>;

    /// First child named `name`; when missing it is inserted at the position
    /// `order` assigns to it, ahead of the first child ranked after it.
    /// Names absent from `order` are appended.
    fn child_or_insert_ordered(&mut self, node: NodeId, name: &str, order: &[&str]) -> Option<NodeId>;

    /// Set `name` to `value` on `node`, creating the attribute when missing.
    fn put_attr(&mut self, node: NodeId, name: &str, value: &str) -> bool;

    /// Integer attribute value, `None` when absent or unparsable.
    fn attr_i32(&self, node: NodeId, name: &str) -> Option<i32>;

    /// Set an integer attribute.
    fn put_attr_i32(&mut self, node: NodeId, name: &str, value: i32) -> bool {
        self.put_attr(node, name, &value.to_string())
    }

    /// Get-or-create `path` below `node`, one element per segment.
    fn path_or_append(&mut self, node: NodeId, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(node, |current, name| self.child_or_append(current, name))
    }
}

impl PropertyStore for XmlTree {
    fn child_or_append(&mut self, node: NodeId, name: &str) -> Option<NodeId> {
        match self.child(node, name) {
            Some(child) => Some(child),
            None => self.append_child(node, name),
        }
    }

    fn child_or_insert_before(&mut self, node: NodeId, name: &str, before: &str) -> Option<NodeId> {
        if let Some(child) = self.child(node, name) {
            return Some(child);
        }
        match self.child(node, before) {
            Some(anchor) => self.insert_before(anchor, name),
            None => self.append_child(node, name),
        }
    }

    fn child_or_insert_ordered(&mut self, node: NodeId, name: &str, order: &[&str]) -> Option<NodeId> {
        if let Some(child) = self.child(node, name) {
            return Some(child);
        }
        let Some(rank) = order.iter().position(|&n| n == name) else {
            return self.append_child(node, name);
        };
        let anchor = self.children(node).iter().copied().find(|&c| {
            self.name(c)
                .and_then(|n| order.iter().position(|&o| o == n))
                .is_some_and(|r| r > rank)
        });
        match anchor {
            Some(anchor) => self.insert_before(anchor, name),
            None => self.append_child(node, name),
        }
    }

    fn put_attr(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        self.set_attr(node, name, value)
    }

    fn attr_i32(&self, node: NodeId, name: &str) -> Option<i32> {
        self.attr(node, name).and_then(|v| v.trim().parse().ok())
    }
}

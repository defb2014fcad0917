//! Arena-backed element tree.
//!
//! Every element lives in a slot of [`XmlTree`] and is addressed by a
//! [`NodeId`] carrying the slot generation. Removing an element bumps the
//! generation of its slot, so ids held by views into a removed subtree stop
//! resolving instead of aliasing whatever reuses the slot later.

/// Generational handle to an element of an [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// An element tree with generational node ids.
#[derive(Debug, Clone)]
pub struct XmlTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl XmlTree {
    /// Create a tree holding only a root element.
    pub fn new(root_name: &str) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.alloc(Element::new(root_name));
        tree
    }

    /// The root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Check if the tree holds only its root.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn alloc(&mut self, element: Element) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = Some(element);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                element: Some(element),
            });
            NodeId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    fn get(&self, id: NodeId) -> Option<&Element> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_mut())
    }

    /// Check if `id` still refers to a live element.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Qualified element name, e.g. `w:p`.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|e| e.name.as_str())
    }

    /// Check if `id` is live and named `name`.
    pub fn is(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|e| e.parent)
    }

    /// Child elements in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// First child named `name`.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&c| self.is(c, name))
    }

    /// Last child named `name`.
    pub fn last_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .rev()
            .copied()
            .find(|&c| self.is(c, name))
    }

    /// All children named `name`.
    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.is(c, name))
    }

    fn position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// Next sibling named `name`.
    pub fn next_sibling(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let (parent, index) = self.position(id)?;
        self.children(parent)[index + 1..]
            .iter()
            .copied()
            .find(|&c| self.is(c, name))
    }

    /// Previous sibling named `name`.
    pub fn prev_sibling(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let (parent, index) = self.position(id)?;
        self.children(parent)[..index]
            .iter()
            .rev()
            .copied()
            .find(|&c| self.is(c, name))
    }

    fn insert_at(&mut self, parent: NodeId, index: usize, name: &str) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let mut element = Element::new(name);
        element.parent = Some(parent);
        let id = self.alloc(element);
        let children = &mut self.get_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, id);
        Some(id)
    }

    /// Append a new element as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, name: &str) -> Option<NodeId> {
        let len = self.children(parent).len();
        self.insert_at(parent, len, name)
    }

    /// Insert a new element as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.insert_at(parent, 0, name)
    }

    /// Insert a new element immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, name: &str) -> Option<NodeId> {
        let (parent, index) = self.position(sibling)?;
        self.insert_at(parent, index, name)
    }

    /// Insert a new element immediately after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, name: &str) -> Option<NodeId> {
        let (parent, index) = self.position(sibling)?;
        self.insert_at(parent, index + 1, name)
    }

    /// Detach `id` from its parent and free its whole subtree.
    ///
    /// Returns false when `id` is dead or is the root.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }
        if let Some((parent, index)) = self.position(id) {
            if let Some(p) = self.get_mut(parent) {
                p.children.remove(index);
            }
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(element) = slot.element.take() {
                stack.extend(element.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
        true
    }

    /// Remove every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.remove(child);
        }
    }

    /// Deep-copy `source` and append the copy as the last child of `parent`.
    pub fn append_copy(&mut self, parent: NodeId, source: NodeId) -> Option<NodeId> {
        let element = self.get(source)?.clone();
        let copy = self.append_child(parent, &element.name)?;
        if let Some(target) = self.get_mut(copy) {
            target.attrs = element.attrs;
            target.text = element.text;
        }
        for child in element.children {
            self.append_copy(copy, child)?;
        }
        Some(copy)
    }

    /// Attribute value by qualified name.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in insertion order.
    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        self.get(id).map(|e| e.attrs.as_slice()).unwrap_or(&[])
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(element) = self.get_mut(id) else {
            return false;
        };
        match element.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => {
                v.clear();
                v.push_str(value);
            }
            None => element.attrs.push((name.to_string(), value.to_string())),
        }
        true
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        let Some(element) = self.get_mut(id) else {
            return false;
        };
        let before = element.attrs.len();
        element.attrs.retain(|(k, _)| k != name);
        element.attrs.len() != before
    }

    /// Character data directly inside `id`.
    pub fn text(&self, id: NodeId) -> &str {
        self.get(id).map(|e| e.text.as_str()).unwrap_or("")
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(element) = self.get_mut(id) {
            element.text.clear();
            element.text.push_str(text);
        }
    }

    pub(crate) fn push_text(&mut self, id: NodeId, text: &str) {
        if let Some(element) = self.get_mut(id) {
            element.text.push_str(text);
        }
    }
}

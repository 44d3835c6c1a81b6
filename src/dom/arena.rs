//! Arena-based XML DOM for package parts.
//!
//! All nodes of a part live in one contiguous vector and link to each other
//! through indices. Detached nodes (fresh clones, removed subtrees) stay in
//! the arena with no parent; they simply stop being reachable from the
//! document root and are dropped when the DOM is.

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// XML attribute with its qualified name and unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Node type in the arena DOM.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Detached holder for a list of sibling nodes. Never serialized itself.
    Fragment,
    /// Element with qualified name (`w:p`) and attributes in source order.
    Element { name: String, attrs: Vec<Attribute> },
    /// Character data, already unescaped.
    Text(String),
    CData(String),
    Comment(String),
    /// Processing instruction content between `<?` and `?>`.
    ProcessingInstruction(String),
    DocType(String),
}

/// A node in the arena DOM.
#[derive(Debug, Clone)]
pub struct XmlNode {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl XmlNode {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

/// The `<?xml ...?>` declaration of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            standalone: Some("yes".to_string()),
        }
    }
}

/// Where [`XmlDom::insert_before_or_append`] placed the new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Inserted as the previous sibling of the anchor.
    Sibling,
    /// The anchor had no parent; appended as its last child instead.
    Child,
}

/// Arena-based XML tree.
#[derive(Debug, Clone)]
pub struct XmlDom {
    nodes: Vec<XmlNode>,
    document: NodeId,
    pub declaration: Option<XmlDeclaration>,
}

impl XmlDom {
    /// Create a new empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId(0),
            declaration: None,
        };
        dom.document = dom.alloc(NodeData::Document);
        dom
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(XmlNode::new(data));
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// First element child of the document root.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.document)
            .find(|&id| self.element_name(id).is_some())
    }

    pub fn node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut XmlNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Number of allocated nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn create_element(&mut self, name: impl Into<String>, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(NodeData::Element {
            name: name.into(),
            attrs,
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    pub fn create_node(&mut self, data: NodeData) -> NodeId {
        self.alloc(data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.first_child)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.last_child)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.next_sibling)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.prev_sibling)
    }

    /// Unlink a node from its parent and siblings. The subtree below it stays
    /// intact. Detaching an already detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = match self.node(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        match prev {
            Some(prev) => {
                if let Some(p) = self.node_mut(prev) {
                    p.next_sibling = next;
                }
            }
            None => {
                if let Some(par) = parent.and_then(|p| self.node_mut(p)) {
                    par.first_child = next;
                }
            }
        }

        match next {
            Some(next) => {
                if let Some(n) = self.node_mut(next) {
                    n.prev_sibling = prev;
                }
            }
            None => {
                if let Some(par) = parent.and_then(|p| self.node_mut(p)) {
                    par.last_child = prev;
                }
            }
        }

        if let Some(node) = self.node_mut(id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
    }

    /// Append a child to a parent node, detaching it first if needed.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last_child = self.last_child(parent);

        if let Some(child_node) = self.node_mut(child) {
            child_node.parent = Some(parent);
            child_node.prev_sibling = last_child;
        }

        if let Some(last) = last_child.and_then(|l| self.node_mut(l)) {
            last.next_sibling = Some(child);
        }

        if let Some(parent_node) = self.node_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = Some(child);
            }
            parent_node.last_child = Some(child);
        }
    }

    /// Insert a node before an attached sibling.
    ///
    /// Returns `false` and leaves the tree untouched if `sibling` has no
    /// parent.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) -> bool {
        let Some(parent) = self.parent(sibling) else {
            return false;
        };
        self.detach(new_node);
        let prev = self.prev_sibling(sibling);

        if let Some(new) = self.node_mut(new_node) {
            new.parent = Some(parent);
            new.prev_sibling = prev;
            new.next_sibling = Some(sibling);
        }

        if let Some(sib) = self.node_mut(sibling) {
            sib.prev_sibling = Some(new_node);
        }

        match prev.and_then(|p| self.node_mut(p)) {
            Some(p) => p.next_sibling = Some(new_node),
            None => {
                if let Some(par) = self.node_mut(parent) {
                    par.first_child = Some(new_node);
                }
            }
        }
        true
    }

    /// Insert a node after an attached sibling.
    ///
    /// Returns `false` and leaves the tree untouched if `sibling` has no
    /// parent.
    pub fn insert_after(&mut self, sibling: NodeId, new_node: NodeId) -> bool {
        let Some(parent) = self.parent(sibling) else {
            return false;
        };
        match self.next_sibling(sibling) {
            Some(next) => self.insert_before(next, new_node),
            None => {
                self.append(parent, new_node);
                true
            }
        }
    }

    /// Insert `new_node` in front of `anchor`, or, when `anchor` is detached,
    /// append it as the last child of `anchor`.
    ///
    /// The fallback is a degraded mode: the caller gets a valid tree, but the
    /// new node ends up nested inside the anchor rather than next to it.
    pub fn insert_before_or_append(&mut self, anchor: NodeId, new_node: NodeId) -> Placement {
        if self.insert_before(anchor, new_node) {
            Placement::Sibling
        } else {
            self.append(anchor, new_node);
            Placement::Child
        }
    }

    /// Detach every child of a node.
    pub fn remove_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }

    /// Deep-clone a subtree. The copy is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let data = match self.node(id) {
            Some(n) => n.data.clone(),
            None => NodeData::Fragment,
        };
        let copy = self.alloc(data);

        let children: Vec<_> = self.children(id).collect();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append(copy, child_copy);
        }
        copy
    }

    /// Append text to an existing trailing text node, or create one.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(last) = self.last_child(parent).and_then(|l| self.node_mut(l))
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text);
        self.append(parent, text_node);
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        ChildrenIter {
            dom: self,
            current: self.first_child(parent),
        }
    }

    /// Iterate over the parent chain, nearest first, excluding the node.
    pub fn ancestors(&self, id: NodeId) -> AncestorsIter<'_> {
        AncestorsIter {
            dom: self,
            current: self.parent(id),
        }
    }

    /// All descendants in document order, excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            out.push(current);
            let mark = stack.len();
            stack.extend(self.children(current));
            stack[mark..].reverse();
        }
        out
    }

    /// Concatenated text of all text and CDATA descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for child in self.descendants(id) {
            if let Some(text) = self.text(child) {
                out.push_str(text);
            }
        }
        out
    }

    /// Text of a text or CDATA node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|n| match &n.data {
            NodeData::Text(s) | NodeData::CData(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Get element's qualified name.
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Check if node is an element with the given qualified name.
    pub fn is_element(&self, id: NodeId, name: &str) -> bool {
        self.element_name(id) == Some(name)
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.node(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value. No-op on non-elements.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(NodeData::Element { attrs, .. }) = self.node_mut(id).map(|n| &mut n.data) {
            let value = value.into();
            match attrs.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attribute::new(name, value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.node_mut(id).map(|n| &mut n.data) {
            attrs.retain(|a| a.name != name);
        }
    }

    /// First direct child element with the given name.
    pub fn child_element(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent).find(|&c| self.is_element(c, name))
    }

    /// Nearest ancestor element with the given name.
    pub fn ancestor_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self.is_element(a, name))
    }

    /// First descendant element with the given name, in document order.
    pub fn find_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|&d| self.is_element(d, name))
    }

    /// Root-to-leaf check that `id` is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.document || self.ancestors(id).any(|a| a == self.document)
    }
}

impl Default for XmlDom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a XmlDom,
    current: Option<NodeId>,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.dom.next_sibling(id);
        Some(id)
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorsIter<'a> {
    dom: &'a XmlDom,
    current: Option<NodeId>,
}

impl Iterator for AncestorsIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.dom.parent(id);
        Some(id)
    }
}

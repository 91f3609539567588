//! The host document tree that sections are carved out of.
//!
//! The section machinery never owns the document: it borrows it through the
//! [`HostTree`] trait, which exposes just enough of a DOM to walk siblings,
//! reparent nodes, flip classes, attributes and inline styles, and drain the
//! child-list mutations the host has queued up. [`Document`] is an arena-backed
//! implementation used by the CLI and the tests.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

/// Opaque handle to a node in a host tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq)]
/// A batch of nodes inserted under one parent.
pub struct MutationRecord {
    /// Parent that received the nodes.
    pub target: NodeId,
    /// Inserted nodes, in insertion order.
    pub added: Vec<NodeId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Modifier keys held while a heading was activated.
pub struct Modifiers {
    /// Control key.
    pub ctrl: bool,
    /// Meta/Command key.
    pub meta: bool,
}

impl Modifiers {
    #[must_use]
    /// Ctrl+activation on Windows/Linux, Cmd+activation on macOS.
    pub fn is_secondary(self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// An activation (click) delivered to a listening heading.
pub struct Activation {
    /// Node the activation originated from.
    pub target: NodeId,
    /// Listening node the activation bubbled up to.
    pub current: NodeId,
    /// Modifier keys held at the time.
    pub modifiers: Modifiers,
}

#[must_use]
/// Heading rank (1-6) for an `h1`..`h6` tag name, case-insensitively.
pub fn heading_rank(tag: &str) -> Option<u8> {
    let bytes = tag.as_bytes();
    if bytes.len() != 2 || !bytes[0].eq_ignore_ascii_case(&b'h') {
        return None;
    }
    match bytes[1] {
        digit @ b'1'..=b'6' => Some(digit - b'0'),
        _ => None,
    }
}

/// Mutable element tree supplied by the host environment.
///
/// Only the required methods touch storage; everything else is derived from
/// them, so a host only needs to bridge the primitives.
pub trait HostTree {
    /// Root of the observed document subtree.
    fn root(&self) -> NodeId;
    /// Lowercase tag name, or `None` for text nodes.
    fn tag(&self, node: NodeId) -> Option<&str>;
    /// Character data of a text node.
    fn text(&self, node: NodeId) -> Option<&str>;
    /// Parent of a node, `None` for the root and detached nodes.
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    /// Child nodes in order.
    fn children(&self, node: NodeId) -> &[NodeId];
    /// Creates a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;
    /// Creates a detached text node.
    fn create_text(&mut self, text: &str) -> NodeId;
    /// Appends `child` to `parent`, moving it out of its current parent first.
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    /// Inserts `child` before `before` under `parent`, or appends when `before` is `None`.
    fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>);
    /// Whether the element's class list contains `class`.
    fn has_class(&self, node: NodeId, class: &str) -> bool;
    /// Adds `class` to the element's class list.
    fn add_class(&mut self, node: NodeId, class: &str);
    /// Removes `class` from the element's class list.
    fn remove_class(&mut self, node: NodeId, class: &str);
    /// Reads an attribute.
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    /// Writes an attribute.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    /// Reads an inline style property.
    fn style(&self, node: NodeId, property: &str) -> Option<&str>;
    /// Writes an inline style property; an empty value removes it.
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);
    /// Subscribes the node to activation events.
    fn listen(&mut self, node: NodeId);
    /// Drains queued child-list mutation records.
    fn take_mutations(&mut self) -> Vec<MutationRecord>;

    /// Whether the node is an element rather than text.
    fn is_element(&self, node: NodeId) -> bool {
        self.tag(node).is_some()
    }

    /// Rank of a heading element, `None` for anything else.
    fn heading_rank(&self, node: NodeId) -> Option<u8> {
        self.tag(node).and_then(heading_rank)
    }

    /// Next sibling that is an element, skipping text.
    fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == node)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|&c| self.is_element(c))
    }

    /// Inserts `node` directly after `reference`. No-op when `reference` is detached.
    fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        let next = {
            let siblings = self.children(parent);
            siblings
                .iter()
                .position(|&c| c == reference)
                .and_then(|pos| siblings.get(pos + 1).copied())
        };
        self.insert_before(parent, node, next);
    }

    /// Inserts `child` as the first child of `parent`.
    fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        let first = self.children(parent).first().copied();
        self.insert_before(parent, child, first);
    }

    /// Inclusive containment: a node contains itself.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether the node is still attached under the root.
    fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root(), node)
    }

    /// Descendants of `node` in document (preorder) order, excluding `node`.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Heading elements under `node` in document order.
    fn headings(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|&n| self.heading_rank(n).is_some())
            .collect()
    }

    /// Concatenated text under `node`, skipping subtrees whose root carries `skip_class`.
    fn text_content_excluding(&self, node: NodeId, skip_class: &str) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if let Some(text) = self.text(n) {
                out.push_str(text);
                continue;
            }
            if n != node && self.has_class(n, skip_class) {
                continue;
            }
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
/// Serialisable description of an element subtree, used to build [`Document`]s.
pub struct NodeDesc {
    /// Element tag name.
    pub tag: String,
    /// Text placed as the element's first child.
    #[serde(default)]
    pub text: Option<String>,
    /// Element attributes; `class` is split into the class list.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Nested elements, after any text.
    #[serde(default)]
    pub children: Vec<NodeDesc>,
}

impl NodeDesc {
    #[must_use]
    /// Element with a text child.
    pub fn new(tag: &str, text: &str) -> Self {
        Self {
            tag: tag.to_string(),
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    /// Element without text.
    pub fn empty(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    /// Adds nested elements.
    pub fn with_children(mut self, children: Vec<NodeDesc>) -> Self {
        self.children.extend(children);
        self
    }

    #[must_use]
    /// Adds an attribute.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Debug)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    style: Vec<(String, String)>,
}

#[derive(Debug)]
enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Slot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed host tree rooted at a `body` element.
///
/// Nodes are never freed; detached subtrees simply become unreachable from
/// the root, the same way a replaced DOM subtree does.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Slot>,
    root: NodeId,
    listeners: HashSet<NodeId>,
    mutations: Vec<MutationRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    #[must_use]
    /// Empty document with a bare `body` root.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            listeners: HashSet::new(),
            mutations: Vec::new(),
        };
        doc.root = doc.create_element("body");
        doc
    }

    #[must_use]
    /// Document whose body holds the described elements.
    pub fn from_nodes(nodes: &[NodeDesc]) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        doc.append_nodes(root, nodes);
        doc.mutations.clear();
        doc
    }

    /// Builds the described elements and appends them under `parent` as one mutation batch.
    pub fn append_nodes(&mut self, parent: NodeId, nodes: &[NodeDesc]) -> Vec<NodeId> {
        let built: Vec<NodeId> = nodes.iter().map(|desc| self.build(desc)).collect();
        self.attach_batch(parent, &built);
        built
    }

    /// Replaces every child of `parent` with the described elements, as a full re-render does.
    pub fn replace_children(&mut self, parent: NodeId, nodes: &[NodeDesc]) -> Vec<NodeId> {
        let old = self.children(parent).to_vec();
        for child in old {
            self.detach(child);
        }
        self.append_nodes(parent, nodes)
    }

    /// Routes an activation on `target` to the nearest listening ancestor, if any.
    #[must_use]
    pub fn dispatch_activation(&self, target: NodeId, modifiers: Modifiers) -> Option<Activation> {
        let mut current = Some(target);
        while let Some(n) = current {
            if self.listeners.contains(&n) {
                return Some(Activation {
                    target,
                    current: n,
                    modifiers,
                });
            }
            current = self.parent(n);
        }
        None
    }

    #[must_use]
    /// Whether the node has an activation listener attached.
    pub fn is_listening(&self, node: NodeId) -> bool {
        self.listeners.contains(&node)
    }

    fn build(&mut self, desc: &NodeDesc) -> NodeId {
        let node = self.create_element(&desc.tag);
        for (name, value) in &desc.attributes {
            if name == "class" {
                for class in value.split_whitespace() {
                    self.add_class(node, class);
                }
            } else {
                self.set_attribute(node, name, value);
            }
        }
        if let Some(text) = &desc.text {
            let text_node = self.create_text(text);
            self.link(node, text_node, None);
        }
        for child in &desc.children {
            let child_node = self.build(child);
            self.link(node, child_node, None);
        }
        node
    }

    fn attach_batch(&mut self, parent: NodeId, nodes: &[NodeId]) {
        let mut added = Vec::with_capacity(nodes.len());
        for &node in nodes {
            if self.link(parent, node, None) {
                added.push(node);
            }
        }
        if !added.is_empty() {
            self.mutations.push(MutationRecord {
                target: parent,
                added,
            });
        }
    }

    fn slot(&self, node: NodeId) -> Option<&Slot> {
        self.nodes.get(node.0 as usize)
    }

    fn slot_mut(&mut self, node: NodeId) -> Option<&mut Slot> {
        self.nodes.get_mut(node.0 as usize)
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.slot(node)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.slot_mut(node)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Slot {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.slot(node).and_then(|s| s.parent) else {
            return;
        };
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.retain(|&c| c != node);
        }
        if let Some(slot) = self.slot_mut(node) {
            slot.parent = None;
        }
    }

    /// Links without recording a mutation. Returns whether the insertion happened.
    fn link(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> bool {
        if self.element(parent).is_none() || self.slot(child).is_none() {
            log::warn!("rejected insertion of {child:?} under non-element {parent:?}");
            return false;
        }
        if self.contains(child, parent) {
            log::warn!("rejected insertion of {child:?} under its own descendant {parent:?}");
            return false;
        }
        self.detach(child);
        let Some(slot) = self.slot_mut(parent) else {
            return false;
        };
        let index = before
            .and_then(|b| slot.children.iter().position(|&c| c == b))
            .unwrap_or(slot.children.len());
        slot.children.insert(index, child);
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
        true
    }

    fn insert(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        if self.link(parent, child, before) {
            self.mutations.push(MutationRecord {
                target: parent,
                added: vec![child],
            });
        }
    }
}

impl HostTree for Document {
    fn root(&self) -> NodeId {
        self.root
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.slot(node)?.kind {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node)?.parent
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.slot(node)
            .map(|s| s.children.as_slice())
            .unwrap_or_default()
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attributes: Vec::new(),
            style: Vec::new(),
        }))
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert(parent, child, None);
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        self.insert(parent, child, before);
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            if !el.classes.iter().any(|c| c == class) {
                el.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.retain(|c| c != class);
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        if let Some(entry) = el.attributes.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value.to_string();
        } else {
            el.attributes.push((name.to_string(), value.to_string()));
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)?
            .style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        if value.is_empty() {
            el.style.retain(|(p, _)| p != property);
        } else if let Some(entry) = el.style.iter_mut().find(|(p, _)| p == property) {
            entry.1 = value.to_string();
        } else {
            el.style.push((property.to_string(), value.to_string()));
        }
    }

    fn listen(&mut self, node: NodeId) {
        self.listeners.insert(node);
    }

    fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }
}

#[cfg(test)]
#[path = "tests/dom.rs"]
mod tests;

// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The lightweight tree node and the arena that owns it.
//!
//! `html5ever` models a node as an opaque `Handle` implemented by whatever
//! DOM the host application provides (an `Rc<RefCell<..>>` tree in `rcdom`,
//! for instance) behind a `TreeSink` trait. This engine has no host DOM to
//! hand nodes to — it owns its own tree and serializes closed subtrees away
//! immediately — so nodes live in a flat arena addressed by `NodeId`
//! (a `Copy` index) instead. Both shadow stacks (the open-elements stack and
//! the active-formatting list) hold plain `NodeId`s; there is no aliasing
//! between them to worry about, and "flatten" is a single state transition
//! on the owning arena slot rather than a graph mutation.

use std::fmt::Write as _;

use crate::sets;

/// The three namespaces this engine recognizes. `html5ever` keeps a fourth,
/// `mathml`/`svg`/`html`/`none`(attr default); we only ever tag elements, so
/// there is no "no namespace" variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    MathMl,
    Svg,
}

/// A `Copy` handle into the arena. Stable for the lifetime of the node: it
/// is never reused, and flattening a node never invalidates handles held by
/// a stack that has already popped it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
enum Child {
    Text(String),
    Node(NodeId),
}

#[derive(Debug)]
pub(crate) struct Node {
    pub namespace: Namespace,
    pub local_name: String,
    /// Canonical attribute string, e.g. `" class=\"a\" id=\"b\""`, or empty.
    pub attrs: String,
    children: Vec<Child>,
    parent: Option<NodeId>,
}

impl Node {
    fn is_void(&self) -> bool {
        self.namespace == Namespace::Html && sets::is_void_element(&self.local_name)
    }
}

enum Slot {
    Live(Node),
    /// Tombstone: the node has been serialized and spliced into its
    /// parent's children as a string. Any further access is an internal
    /// invariant violation (invariant (b) in the data model).
    Flattened,
}

/// Owns every node ever created during one `balance` call.
pub(crate) struct Arena {
    slots: Vec<Slot>,
    /// Index 0, always: the sentinel root `<html>` element. Never flattened
    /// individually; at the end of the parse its children are concatenated
    /// directly, stripping the wrapper (see `Arena::take_output`).
    root: NodeId,
}

impl Arena {
    pub fn new() -> Self {
        let mut slots = Vec::new();
        slots.push(Slot::Live(Node {
            namespace: Namespace::Html,
            local_name: "html".to_string(),
            attrs: String::new(),
            children: Vec::new(),
            parent: None,
        }));
        Arena {
            slots,
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(
        &mut self,
        namespace: Namespace,
        local_name: impl Into<String>,
        attrs: impl Into<String>,
    ) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot::Live(Node {
            namespace,
            local_name: local_name.into(),
            attrs: attrs.into(),
            children: Vec::new(),
            parent: None,
        }));
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        match &self.slots[id.0] {
            Slot::Live(n) => n,
            Slot::Flattened => panic!("internal invariant violation: access to flattened node"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match &mut self.slots[id.0] {
            Slot::Live(n) => n,
            Slot::Flattened => panic!("internal invariant violation: access to flattened node"),
        }
    }

    pub fn namespace(&self, id: NodeId) -> Namespace {
        self.node(id).namespace
    }

    pub fn local_name(&self, id: NodeId) -> &str {
        &self.node(id).local_name
    }

    pub fn attrs(&self, id: NodeId) -> &str {
        &self.node(id).attrs
    }

    pub fn add_attrs_if_missing(&mut self, id: NodeId, extra: &str) {
        let existing = self.node(id).attrs.clone();
        let mut merged = existing.clone();
        for pair in crate::attrs::iter_attrs(extra) {
            if crate::attrs::attr_value(&existing, pair.0).is_none() {
                let _ = write!(merged, " {}=\"{}\"", pair.0, pair.1);
            }
        }
        self.node_mut(id).attrs = merged;
    }

    pub fn is_html_named(&self, id: NodeId, name: &str) -> bool {
        let n = self.node(id);
        n.namespace == Namespace::Html && n.local_name == name
    }

    /// Append a child node to `parent`'s children list (invariant (a):
    /// appended at the tail).
    pub fn append_node(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(Child::Node(child));
    }

    /// Append text, coalescing with a trailing text child if present.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        let children = &mut self.node_mut(parent).children;
        if let Some(Child::Text(existing)) = children.last_mut() {
            existing.push_str(text);
        } else {
            children.push(Child::Text(text.to_string()));
        }
    }

    /// Insert text at the appropriate place for insertion (§4.5 "insert a
    /// character"): appended to `parent`'s children, or spliced immediately
    /// before `before` when foster-parenting redirected the insertion point
    /// ahead of an open `<table>`. Coalesces with an adjacent text sibling
    /// either way, matching `append_text`'s discipline.
    pub fn insert_text(&mut self, parent: NodeId, before: Option<NodeId>, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(before) = before else {
            return self.append_text(parent, text);
        };
        let children = &mut self.node_mut(parent).children;
        let pos = children
            .iter()
            .position(|c| matches!(c, Child::Node(n) if *n == before))
            .unwrap_or(children.len());
        if pos > 0 {
            if let Child::Text(existing) = &mut children[pos - 1] {
                existing.push_str(text);
                return;
            }
        }
        children.insert(pos, Child::Text(text.to_string()));
    }

    /// Insert `child` as the node immediately before `before` in `parent`'s
    /// children (used by table foster-parenting: "insert into the table's
    /// parent immediately before the table node").
    pub fn insert_node_before(&mut self, parent: NodeId, before: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        let children = &mut self.node_mut(parent).children;
        let pos = children
            .iter()
            .position(|c| matches!(c, Child::Node(n) if *n == before))
            .unwrap_or(children.len());
        children.insert(pos, Child::Node(child));
    }

    /// Detach `child` from its current parent's children list without
    /// flattening it, so it can be re-parented elsewhere (adoption agency).
    pub fn remove_from_parent(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).parent else {
            return;
        };
        let children = &mut self.node_mut(parent).children;
        if let Some(pos) = children
            .iter()
            .position(|c| matches!(c, Child::Node(n) if *n == child))
        {
            children.remove(pos);
        }
        self.node_mut(child).parent = None;
    }

    /// Move all of `from`'s children onto the end of `to`'s children list
    /// (adoption agency step 16: "Move all children of furthestBlock into
    /// this clone").
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let taken = std::mem::take(&mut self.node_mut(from).children);
        for child in &taken {
            if let Child::Node(n) = child {
                self.node_mut(*n).parent = Some(to);
            }
        }
        self.node_mut(to).children.extend(taken);
    }

    /// Serialize `id`'s subtree and splice the result into its parent's
    /// children list in its place, then tombstone the slot. Matches the
    /// fragment-serialization algorithm: void elements never emit a close
    /// tag and must have no children.
    pub fn flatten(&mut self, id: NodeId) {
        let rendered = self.render(id);
        if let Some(parent) = self.node(id).parent {
            let children = &mut self.node_mut(parent).children;
            if let Some(pos) = children
                .iter()
                .position(|c| matches!(c, Child::Node(n) if *n == id))
            {
                children[pos] = Child::Text(rendered);
                // Coalesce with an immediate text neighbour so invariant (a)
                // ("all but the last child may be text") stays easy to scan.
                if pos > 0 {
                    if let (Child::Text(prev), Child::Text(cur)) =
                        (&children[pos - 1], &children[pos])
                    {
                        let merged = format!("{prev}{cur}");
                        children.remove(pos);
                        children[pos - 1] = Child::Text(merged);
                    }
                }
            }
        }
        self.slots[id.0] = Slot::Flattened;
    }

    fn render(&self, id: NodeId) -> String {
        let node = self.node(id);
        let mut out = String::new();
        let _ = write!(out, "<{}{}>", node.local_name, node.attrs);
        if node.is_void() {
            debug_assert!(
                node.children.is_empty(),
                "void element {} must not have children",
                node.local_name
            );
            return out;
        }
        for child in &node.children {
            match child {
                Child::Text(s) => out.push_str(s),
                // A live child here means it was never popped before its
                // parent (shouldn't happen under normal LIFO stack
                // discipline); render it defensively rather than losing it.
                Child::Node(n) => out.push_str(&self.render(*n)),
            }
        }
        let _ = write!(out, "</{}>", node.local_name);
        out
    }

    /// Flatten every remaining child of `id` and concatenate the result,
    /// without emitting `id`'s own open/close tags. Used once, at the very
    /// end, to strip the `<html>` wrapper from the output (§6).
    pub fn take_output(&mut self, id: NodeId) -> String {
        let children = std::mem::take(&mut self.node_mut(id).children);
        let mut out = String::new();
        for child in children {
            match child {
                Child::Text(s) => out.push_str(&s),
                Child::Node(n) => {
                    out.push_str(&self.render(n));
                    self.slots[n.0] = Slot::Flattened;
                }
            }
        }
        out
    }
}

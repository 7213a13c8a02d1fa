// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The stack of open elements (§4.2).
//!
//! `html5ever`'s `ElemStack` backs its scope queries with a `HashMap<_,
//! usize>` of per-tag occurrence counts so that `in_scope` doesn't have to
//! walk the whole stack on documents with thousands of open elements. Our
//! input is a bounded fragment, not an arbitrary document, so a plain `Vec`
//! walked top-down is the right-sized version of the same idea.

use crate::node::{Arena, NodeId};

pub(crate) struct OpenElementStack {
    items: Vec<NodeId>,
    /// Mirrors `html5ever`'s `foster_parenting` flag: set while a table
    /// element is open and misplaced content is being redirected to the
    /// table's parent instead of the table itself (§4.5).
    pub(crate) foster_parenting: bool,
}

impl OpenElementStack {
    pub(crate) fn new(root: NodeId) -> Self {
        OpenElementStack {
            items: vec![root],
            foster_parenting: false,
        }
    }

    pub(crate) fn push(&mut self, id: NodeId) {
        self.items.push(id);
    }

    pub(crate) fn pop(&mut self) -> Option<NodeId> {
        self.items.pop()
    }

    pub(crate) fn top(&self) -> NodeId {
        *self.items.last().expect("open element stack is never empty")
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.items.contains(&id)
    }

    /// Iterate from the top of the stack (most recently opened) downward.
    pub(crate) fn iter_from_top(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().rev().copied()
    }

    /// Pop elements off the stack until and including the first one
    /// matching `pred`, flattening each as it closes (§9's "flatten on
    /// pop" memory bound); no-op if the stack is already exhausted.
    pub(crate) fn pop_until<F: Fn(&Arena, NodeId) -> bool>(&mut self, arena: &mut Arena, pred: F) {
        while let Some(top) = self.items.pop() {
            let done = pred(arena, top);
            arena.flatten(top);
            if done {
                break;
            }
        }
    }

    /// Position of `id` from the bottom of the stack, if present.
    pub(crate) fn position(&self, id: NodeId) -> Option<usize> {
        self.items.iter().position(|&n| n == id)
    }

    /// Replace the element at `index` (bottom-indexed) in place, used by
    /// the adoption agency to swap a furthest block's stack slot for its
    /// clone.
    pub(crate) fn replace_at(&mut self, index: usize, id: NodeId) {
        self.items[index] = id;
    }

    /// Remove a specific element wherever it sits in the stack, used by
    /// the adoption agency once a formatting element has been relocated.
    pub(crate) fn remove(&mut self, id: NodeId) {
        if let Some(pos) = self.position(id) {
            self.items.remove(pos);
        }
    }

    /// Insert `id` immediately above `after` in the stack.
    pub(crate) fn insert_above(&mut self, after: NodeId, id: NodeId) {
        let pos = self.position(after).map(|p| p + 1).unwrap_or(self.items.len());
        self.items.insert(pos, id);
    }

    /// The generic "has an element in scope" walk that backs the default,
    /// list-item, button and table scope predicates (§4.2): scan down from
    /// the top of the stack, returning `true` on hitting an element
    /// matching `target` before one matching `scope_limit`.
    pub(crate) fn has_in_scope<T, S>(&self, arena: &Arena, target: T, scope_limit: S) -> bool
    where
        T: Fn(&Arena, NodeId) -> bool,
        S: Fn(&Arena, NodeId) -> bool,
    {
        for &id in self.items.iter().rev() {
            if target(arena, id) {
                return true;
            }
            if scope_limit(arena, id) {
                return false;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Namespace;

    #[test]
    fn push_pop_and_top() {
        let mut arena = Arena::new();
        let mut stack = OpenElementStack::new(arena.root());
        let child = arena.create_element(Namespace::Html, "div", "");
        stack.push(child);
        assert_eq!(stack.top(), child);
        assert_eq!(stack.pop(), Some(child));
        assert_eq!(stack.top(), arena.root());
    }

    #[test]
    fn pop_until_stops_at_match() {
        let mut arena = Arena::new();
        let mut stack = OpenElementStack::new(arena.root());
        let a = arena.create_element(Namespace::Html, "div", "");
        let b = arena.create_element(Namespace::Html, "span", "");
        stack.push(a);
        stack.push(b);
        stack.pop_until(&mut arena, |arena, id| arena.is_html_named(id, "div"));
        assert_eq!(stack.top(), arena.root());
    }

    #[test]
    fn has_in_scope_stops_at_limit() {
        let mut arena = Arena::new();
        let mut stack = OpenElementStack::new(arena.root());
        let table = arena.create_element(Namespace::Html, "table", "");
        let td = arena.create_element(Namespace::Html, "td", "");
        let p = arena.create_element(Namespace::Html, "p", "");
        stack.push(table);
        stack.push(td);
        stack.push(p);
        let is_div = |arena: &Arena, id: NodeId| arena.is_html_named(id, "div");
        let default_scope = |arena: &Arena, id: NodeId| crate::sets::default_scope(arena, id);
        assert!(!stack.has_in_scope(&arena, is_div, default_scope));
    }
}

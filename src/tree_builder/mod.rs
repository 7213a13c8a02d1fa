// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The tree-construction engine proper: owns the arena, the stack of open
//! elements, the active formatting list, and the insertion-mode state
//! machine. Laid out the way `html5ever::tree_builder::TreeBuilder` is —
//! one struct holding all mutable parse state, with the algorithm broken
//! out across sibling modules (`adoption`, `modes`) that `impl` more
//! methods onto it — rather than as free functions threading state through
//! parameters.

mod adoption;
mod modes;
pub(crate) mod types;

use crate::config::Config;
use crate::error::BalanceError;
use crate::formatting::ActiveFormattingList;
use crate::node::{Arena, Namespace, NodeId};
use crate::stack::OpenElementStack;
use types::{InsertionMode, ProcessResult, Token};

pub(crate) struct TreeBuilder<'cfg> {
    pub(crate) arena: Arena,
    pub(crate) stack: OpenElementStack,
    pub(crate) afe: ActiveFormattingList,
    mode: InsertionMode,
    /// §3 "TemplateInsertionModes": the mode each currently-open `<template>`
    /// should resume in once nested table-structure content resets the
    /// mode out from under it. Mirrors `html5ever`'s `template_modes` stack.
    template_modes: Vec<InsertionMode>,
    /// §3 "Pending table text": character tokens collected while in
    /// `InTableText`, so the whitespace-vs-non-whitespace decision that
    /// picks foster-parenting or not can be made retroactively once the
    /// whole run is in hand (§4.5/§4.6 "Text coalescing in tables").
    pending_table_text: String,
    config: &'cfg Config,
    errors: Vec<String>,
}

impl<'cfg> TreeBuilder<'cfg> {
    pub(crate) fn new(config: &'cfg Config) -> Self {
        let arena = Arena::new();
        let stack = OpenElementStack::new(arena.root());
        TreeBuilder {
            arena,
            stack,
            afe: ActiveFormattingList::new(),
            mode: InsertionMode::InBody,
            template_modes: Vec::new(),
            pending_table_text: String::new(),
            config,
            errors: Vec::new(),
        }
    }

    /// Feed one token all the way to completion, including any
    /// `Reprocess` bounces between insertion modes (§4.5).
    pub(crate) fn process(&mut self, token: Token) {
        loop {
            let mode = self.mode;
            log::debug!("processing {token:?} in insertion mode {mode:?}");
            match self.step(mode, &token) {
                ProcessResult::Done => break,
                ProcessResult::Reprocess(next) => self.mode = next,
            }
        }
    }

    /// Run every open element's implied closing and flush the arena down
    /// to plain text, mirroring "reset the insertion point" at end of
    /// input (§4.5: the only token-less step the state machine takes).
    pub(crate) fn finish(mut self) -> Result<String, BalanceError> {
        while self.stack.len() > 1 {
            let top = self.stack.top();
            self.stack.pop();
            self.arena.flatten(top);
        }
        if self.config.strict && !self.errors.is_empty() {
            return Err(BalanceError::Malformed(self.errors.join("; ")));
        }
        let root = self.arena.root();
        Ok(self.arena.take_output(root))
    }

    pub(crate) fn log_parse_error(&mut self, message: &str) {
        log::warn!("parse error: {message}");
        self.errors.push(message.to_string());
    }

    pub(crate) fn stack_at(&self, index: usize) -> NodeId {
        self.stack.iter_from_top().nth(self.stack.len() - 1 - index).expect("index in range")
    }

    /// Is `target` reachable from the top of the open-elements stack before
    /// an element matching `scope_limit` is hit (§4.2's scope predicates)?
    pub(crate) fn element_in_scope(
        &self,
        target: NodeId,
        scope_limit: impl Fn(&Arena, NodeId) -> bool,
    ) -> bool {
        self.stack.has_in_scope(&self.arena, |_, id| id == target, scope_limit)
    }

    pub(crate) fn tag_in_scope(
        &self,
        name: &str,
        scope_limit: impl Fn(&Arena, NodeId) -> bool,
    ) -> bool {
        self.stack
            .has_in_scope(&self.arena, |arena, id| arena.is_html_named(id, name), scope_limit)
    }

    /// The element directly below `node` in the stack of open elements —
    /// used by the adoption agency to find the "common ancestor" for
    /// reinsertion.
    fn element_below(&self, node: NodeId) -> NodeId {
        let idx = self.stack.position(node).expect("node is on the stack");
        self.stack_at(idx.saturating_sub(1))
    }

    /// §4.5 "appropriate place for inserting a node": ordinarily `target`
    /// itself, but redirected while foster-parenting is active and `target`
    /// is a table/section/row — the insertion site is then the last open
    /// `<template>` if it sits above the last open `<table>`, else the
    /// table's parent immediately before the table, else the root (§4.2).
    /// Adoption-agency reinsertion calls this with an override target (the
    /// "common ancestor") instead of the current node.
    fn appropriate_insertion_point_for(&self, target: NodeId) -> (NodeId, Option<NodeId>) {
        if self.stack.foster_parenting && crate::sets::foster_target(&self.arena, target) {
            let template_idx = self
                .stack
                .iter_from_top()
                .position(|id| self.arena.is_html_named(id, "template"));
            let table_idx = self
                .stack
                .iter_from_top()
                .position(|id| self.arena.is_html_named(id, "table"));
            match (template_idx, table_idx) {
                (Some(t), Some(tb)) if t < tb => {
                    let template = self.stack_at(self.stack.len() - 1 - t);
                    return (template, None);
                },
                (Some(t), None) => {
                    let template = self.stack_at(self.stack.len() - 1 - t);
                    return (template, None);
                },
                (_, Some(tb)) => {
                    let table = self.stack_at(self.stack.len() - 1 - tb);
                    if let Some(parent) = self.arena_parent(table) {
                        return (parent, Some(table));
                    }
                    return (self.arena.root(), Some(table));
                },
                (None, None) => return (self.arena.root(), None),
            }
        }
        if self.arena.is_html_named(target, "template") {
            // No separate "template contents" tree is modeled (§3): the
            // template element itself stands in for its contents fragment.
            return (target, None);
        }
        (target, None)
    }

    fn appropriate_insertion_point(&self) -> (NodeId, Option<NodeId>) {
        self.appropriate_insertion_point_for(self.stack.top())
    }

    fn arena_parent(&self, id: NodeId) -> Option<NodeId> {
        // Our arena only tracks a parent pointer per node, but stack
        // positions already give us the logical ancestor chain during tree
        // construction, which is what foster parenting needs. The node a
        // `<table>` was inserted under is simply the open element directly
        // below it on the stack.
        let idx = self.stack.position(id)?;
        if idx == 0 {
            None
        } else {
            Some(self.stack_at(idx - 1))
        }
    }

    fn insert_at(&mut self, place: (NodeId, Option<NodeId>), child: NodeId) {
        match place {
            (parent, Some(before)) => self.arena.insert_node_before(parent, before, child),
            (parent, None) => self.arena.append_node(parent, child),
        }
    }

    /// Insert character data at the appropriate place for insertion (§4.5
    /// "insert a character"), respecting foster parenting exactly like an
    /// element insertion would — including landing *before* the foster
    /// target table rather than just inside its parent.
    pub(crate) fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let (parent, before) = self.appropriate_insertion_point();
        self.arena.insert_text(parent, before, text);
    }

    /// Create and push an HTML-namespaced element, inserted at the
    /// appropriate place (§4.5 "insert an HTML element").
    pub(crate) fn insert_html_element(&mut self, name: &str, attrs: &str) -> NodeId {
        let id = self.arena.create_element(Namespace::Html, name.to_string(), attrs.to_string());
        let place = self.appropriate_insertion_point();
        self.insert_at(place, id);
        self.stack.push(id);
        id
    }

    /// Insert a foreign (MathML/SVG) element without touching foster
    /// parenting, which only ever targets HTML table structure.
    pub(crate) fn insert_foreign_element(&mut self, ns: Namespace, name: &str, attrs: &str) -> NodeId {
        let id = self.arena.create_element(ns, name.to_string(), attrs.to_string());
        self.arena.append_node(self.stack.top(), id);
        self.stack.push(id);
        id
    }

    /// §4.3 "reconstruct the active formatting elements": walk the AFE
    /// list back to the nearest marker/start, re-inserting and re-pushing
    /// any entries whose node fell off the stack of open elements (e.g.
    /// after a `<table>` closed and reopened the active `<a>` around it).
    pub(crate) fn reconstruct_active_formatting_elements(&mut self) {
        if self.afe.len() == 0 {
            return;
        }
        let last_idx = self.afe.len() - 1;
        if self.is_marker_or_on_stack(last_idx) {
            return;
        }
        let floor = self.afe.last_marker_or_start();
        let mut idx = last_idx;
        while idx > floor && !self.is_marker_or_on_stack(idx - 1) {
            idx -= 1;
        }
        loop {
            let (local_name, attrs) = {
                let crate::formatting::FormatEntry::Element { local_name, attrs, .. } = self.afe.get(idx).clone()
                else {
                    unreachable!("walked past a marker despite the floor check")
                };
                (local_name, attrs)
            };
            let clone = self.insert_html_element(&local_name, &attrs);
            self.afe.replace_at(idx, clone, local_name, attrs);
            if idx == last_idx {
                break;
            }
            idx += 1;
        }
    }

    fn is_marker_or_on_stack(&self, idx: usize) -> bool {
        match self.afe.get(idx) {
            crate::formatting::FormatEntry::Marker => true,
            crate::formatting::FormatEntry::Element { node, .. } => self.stack.contains(*node),
        }
    }

    /// §4.5 "generate implied end tags": pop elements matching `set` off
    /// the stack (cursory set by default; thorough set when closing out a
    /// whole table cell/caption/etc.), optionally never popping
    /// `except_name` itself.
    pub(crate) fn generate_implied_end_tags(&mut self, thorough: bool, except_name: Option<&str>) {
        loop {
            let top = self.stack.top();
            if let Some(except) = except_name {
                if self.arena.is_html_named(top, except) {
                    return;
                }
            }
            let matches = if thorough {
                crate::sets::thorough_implied_end_tags(&self.arena, top)
            } else {
                crate::sets::cursory_implied_end(&self.arena, top)
            };
            if !matches {
                return;
            }
            self.stack.pop();
            self.arena.flatten(top);
        }
    }

    /// §4.2 "close a `<p>` element": only invoked when one is known to be
    /// in button scope by the caller.
    pub(crate) fn close_p_element(&mut self) {
        self.generate_implied_end_tags(false, Some("p"));
        if !self.arena.is_html_named(self.stack.top(), "p") {
            self.log_parse_error("expected current node to be <p> while closing it");
        }
        self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, "p"));
    }

    pub(crate) fn current_namespace(&self) -> Namespace {
        self.arena.namespace(self.stack.top())
    }

    pub(crate) fn is_unsupported(&self, name: &str) -> bool {
        crate::sets::is_unsupported_element(name)
            || self
                .config
                .allowed_html_elements
                .as_ref()
                .is_some_and(|allowed| !allowed.contains(name))
    }

    pub(crate) fn set_mode(&mut self, mode: InsertionMode) {
        self.mode = mode;
    }
}

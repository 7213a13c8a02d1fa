// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The list of active formatting elements (§4.3).
//!
//! Mirrors `html5ever::tree_builder::actions::insert_marker` /
//! `append_formatting_element`'s view of the list: a sequence of entries,
//! each either `Marker` (a boundary inserted by `<table>`/`<object>`/etc.
//! nesting) or an `Element` entry carrying enough of the original start tag
//! (name + attributes) to recreate an equivalent element if reconstruction
//! needs to clone it back in.

use crate::node::NodeId;

#[derive(Clone)]
pub(crate) enum FormatEntry {
    Marker,
    Element {
        node: NodeId,
        local_name: String,
        attrs: String,
    },
}

pub(crate) struct ActiveFormattingList {
    entries: Vec<FormatEntry>,
}

/// Noah's Ark clause (§4.3): a tag name/attribute pair may not appear more
/// than three times since the last marker before the oldest copy is
/// dropped.
const NOAHS_ARK_LIMIT: usize = 3;

impl ActiveFormattingList {
    pub(crate) fn new() -> Self {
        ActiveFormattingList { entries: Vec::new() }
    }

    pub(crate) fn insert_marker(&mut self) {
        self.entries.push(FormatEntry::Marker);
    }

    /// Push a formatting element entry, first applying the Noah's Ark
    /// clause: if three entries since the last marker already match this
    /// element's name and attributes, the earliest one is removed.
    pub(crate) fn push(&mut self, node: NodeId, local_name: String, attrs: String) {
        let mut matches_since_marker = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormatEntry::Marker => break,
                FormatEntry::Element {
                    local_name: n,
                    attrs: a,
                    ..
                } => {
                    if *n == local_name && *a == attrs {
                        matches_since_marker.push(idx);
                    }
                },
            }
        }
        if matches_since_marker.len() >= NOAHS_ARK_LIMIT {
            let earliest = *matches_since_marker.last().unwrap();
            self.entries.remove(earliest);
        }
        self.entries.push(FormatEntry::Element {
            node,
            local_name,
            attrs,
        });
    }

    /// Remove every entry down to and including the most recent marker, or
    /// every entry if there is no marker (§4.3, used when a table-scoped
    /// construct closes).
    pub(crate) fn clear_to_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if matches!(entry, FormatEntry::Marker) {
                break;
            }
        }
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.entries.retain(|e| !matches!(e, FormatEntry::Element { node: n, .. } if *n == node));
    }

    pub(crate) fn position_of(&self, node: NodeId) -> Option<usize> {
        self.entries.iter().position(|e| matches!(e, FormatEntry::Element { node: n, .. } if *n == node))
    }

    pub(crate) fn replace_at(&mut self, index: usize, node: NodeId, local_name: String, attrs: String) {
        self.entries[index] = FormatEntry::Element {
            node,
            local_name,
            attrs,
        };
    }

    pub(crate) fn insert_at(&mut self, index: usize, entry: FormatEntry) {
        self.entries.insert(index, entry);
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> FormatEntry {
        self.entries.remove(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, index: usize) -> &FormatEntry {
        &self.entries[index]
    }

    /// The last element entry before hitting a marker or the start of the
    /// list, walking from the tail — used by
    /// `reconstruct_active_formatting_elements` to find where reconstruction
    /// needs to resume from.
    pub(crate) fn last_marker_or_start(&self) -> usize {
        for (idx, entry) in self.entries.iter().enumerate().rev() {
            if matches!(entry, FormatEntry::Marker) {
                return idx + 1;
            }
        }
        0
    }

    /// Find the most recent element entry with the given tag name, down to
    /// the last marker (used by the adoption agency to locate the
    /// formatting element named in an end tag).
    pub(crate) fn find_recent(&self, local_name: &str) -> Option<(usize, NodeId)> {
        for (idx, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormatEntry::Marker => return None,
                FormatEntry::Element { node, local_name: n, .. } if n == local_name => {
                    return Some((idx, *node));
                },
                FormatEntry::Element { .. } => {},
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noahs_ark_evicts_oldest_duplicate() {
        let mut list = ActiveFormattingList::new();
        let mut arena = crate::node::Arena::new();
        let nodes: Vec<_> = (0..4)
            .map(|_| arena.create_element(crate::node::Namespace::Html, "a", r#" href="x""#))
            .collect();
        for &n in &nodes {
            list.push(n, "a".to_string(), r#" href="x""#.to_string());
        }
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn marker_bounds_noahs_ark() {
        let mut list = ActiveFormattingList::new();
        let mut arena = crate::node::Arena::new();
        for _ in 0..3 {
            let n = arena.create_element(crate::node::Namespace::Html, "a", "");
            list.push(n, "a".to_string(), String::new());
        }
        list.insert_marker();
        let n = arena.create_element(crate::node::Namespace::Html, "a", "");
        list.push(n, "a".to_string(), String::new());
        assert_eq!(list.len(), 5);
    }
}

// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Adoption Agency Algorithm (§4.4), ported from `html5ever`'s
//! `TreeBuilder::adoption_agency` and adapted from `Handle` cloning to
//! arena `NodeId`s. The outer loop bound, the bookmark-based reinsertion
//! point, and the "Noah's Ark already keeps entries bounded to three"
//! comment all come straight from that source.

use super::TreeBuilder;
use crate::formatting::FormatEntry;
use crate::node::NodeId;

/// https://html.spec.whatwg.org/#adoption-agency-algorithm caps the outer
/// loop at 8 iterations to guarantee termination on pathological input;
/// `html5ever` keeps the same constant.
const ADOPTION_AGENCY_OUTER_LOOP_LIMIT: u32 = 8;

/// Where the reconstructed formatting element's active-formatting-list
/// entry lands once the inner loop finishes, mirroring `html5ever`'s
/// `Bookmark` enum exactly (§4.4 steps 12 and 18).
enum Bookmark {
    Replace(NodeId),
    InsertAfter(NodeId),
}

impl<'cfg> TreeBuilder<'cfg> {
    /// Run the adoption agency for an end tag named `subject`. Always
    /// returns `true`; the bool is kept only because callers historically
    /// branched on it and some still ignore the result, matching the
    /// teacher's `fn adoption_agency` signature shape.
    pub(crate) fn adoption_agency(&mut self, subject: &str) -> bool {
        // §4.4 step 1: if the current node is already named `subject` and
        // isn't itself a tracked formatting element (e.g. it was already
        // evicted by Noah's Ark), just pop it and we're done.
        if self.arena.is_html_named(self.stack.top(), subject) && self.afe.position_of(self.stack.top()).is_none() {
            let top = self.stack.top();
            self.stack.pop();
            self.arena.flatten(top);
            return true;
        }

        for _ in 0..ADOPTION_AGENCY_OUTER_LOOP_LIMIT {
            // step 5.
            let Some((afe_index, formatting_node)) = self.afe.find_recent(subject) else {
                // §4.4 step 4: no active formatting element by this name at
                // all (not even one evicted by Noah's Ark or a marker) —
                // fall back to the generic "any other end tag" algorithm
                // instead of silently doing nothing.
                self.any_other_end_tag(subject);
                return true;
            };

            let Some(formatting_stack_index) = self.stack.position(formatting_node) else {
                self.log_parse_error(&format!("formatting element for </{subject}> not open"));
                self.afe.remove_at(afe_index);
                return true;
            };

            // step 7.
            if !self.element_in_scope(formatting_node, crate::sets::default_scope) {
                self.log_parse_error(&format!("end tag {subject} not in scope"));
                return true;
            }

            // step 8.
            if formatting_node != self.stack.top() {
                self.log_parse_error(&format!("end tag {subject} does not match current node"));
            }

            // step 9: the topmost special element at or above the
            // formatting element's stack position.
            let furthest_block = (formatting_stack_index..self.stack.len())
                .map(|i| self.stack_at(i))
                .find(|&id| crate::sets::special_tag(&self.arena, id));

            let Some(furthest_block) = furthest_block else {
                // step 10: no special element above it — pop everything
                // down to and including the formatting element and drop
                // its AFE entry.
                self.stack.pop_until(&mut self.arena, |_, id| id == formatting_node);
                self.afe.remove_at(afe_index);
                return true;
            };

            // step 11.
            let common_ancestor = self.element_below(formatting_node);

            // step 12.
            let mut bookmark = Bookmark::Replace(formatting_node);

            // step 13.
            let mut node;
            let mut node_index = self.stack.position(furthest_block).expect("furthest block is on the stack");
            let mut last_node = furthest_block;
            let mut inner_counter = 0u32;

            loop {
                // 13.2 / 13.3: walk one slot up the stack from the furthest
                // block toward the formatting element before doing anything
                // else, exactly like the teacher's `node_index -= 1`.
                inner_counter += 1;
                node_index -= 1;
                node = self.stack_at(node_index);

                // 13.4.
                if node == formatting_node {
                    break;
                }

                // 13.5: once the inner loop has run more than three times,
                // any remaining formatting element in the way is just
                // discarded rather than cloned forward.
                if inner_counter > 3 {
                    if let Some(pos) = self.afe.position_of(node) {
                        self.afe.remove_at(pos);
                    }
                    self.stack.remove(node);
                    continue;
                }

                // 13.6: `node` isn't (or is no longer) a tracked formatting
                // element — drop it from the stack and move on without
                // touching `last_node`.
                let Some(node_afe_index) = self.afe.position_of(node) else {
                    self.stack.remove(node);
                    continue;
                };

                // 13.7: clone `node` and swap the clone into both the
                // stack and the active formatting list in its place.
                let (local_name, attrs) = {
                    let FormatEntry::Element { local_name, attrs, .. } = self.afe.get(node_afe_index).clone()
                    else {
                        unreachable!("node_afe_index always names an Element entry")
                    };
                    (local_name, attrs)
                };
                let clone = self.arena.create_element(self.arena.namespace(node), local_name.clone(), attrs.clone());
                self.stack.replace_at(node_index, clone);
                self.afe.replace_at(node_afe_index, clone, local_name, attrs);
                node = clone;

                // 13.8: once the first clone has been made, the bookmark
                // moves to just after it, so a later reinsertion lands
                // beside the freshly reconstructed chain instead of at the
                // original formatting element's old position.
                if last_node == furthest_block {
                    bookmark = Bookmark::InsertAfter(node);
                }

                // 13.9 / 13.10.
                self.arena.remove_from_parent(last_node);
                self.arena.append_node(node, last_node);
                last_node = node;
            }

            // step 14: place `last_node` via the ordinary insertion-point
            // rules (foster-parenting if `common_ancestor` is a
            // table/section/row and we're inside a table, else a plain
            // append).
            self.arena.remove_from_parent(last_node);
            let place = self.appropriate_insertion_point_for(common_ancestor);
            self.insert_at(place, last_node);

            // step 15.
            let (fmt_local_name, fmt_attrs) = {
                let idx = self
                    .afe
                    .position_of(formatting_node)
                    .expect("formatting element always has an AFE entry here");
                let FormatEntry::Element { local_name, attrs, .. } = self.afe.get(idx).clone() else {
                    unreachable!()
                };
                (local_name, attrs)
            };
            let new_element = self
                .arena
                .create_element(self.arena.namespace(formatting_node), fmt_local_name.clone(), fmt_attrs.clone());

            // steps 16-17.
            self.arena.reparent_children(furthest_block, new_element);
            self.arena.append_node(furthest_block, new_element);

            // step 18.
            match bookmark {
                Bookmark::Replace(to_replace) => {
                    let index = self
                        .afe
                        .position_of(to_replace)
                        .expect("bookmark not found in active formatting elements");
                    self.afe.replace_at(index, new_element, fmt_local_name, fmt_attrs);
                },
                Bookmark::InsertAfter(previous) => {
                    let index = self
                        .afe
                        .position_of(previous)
                        .expect("bookmark not found in active formatting elements")
                        + 1;
                    self.afe.insert_at(
                        index,
                        FormatEntry::Element {
                            node: new_element,
                            local_name: fmt_local_name,
                            attrs: fmt_attrs,
                        },
                    );
                    let old_index = self
                        .afe
                        .position_of(formatting_node)
                        .expect("formatting element not found in active formatting elements");
                    self.afe.remove_at(old_index);
                },
            }

            // step 19.
            self.stack.remove(formatting_node);
            self.stack.insert_above(furthest_block, new_element);
        }
        true
    }
}

// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The insertion-mode handlers (§4.5), plus the foreign-content dispatch
//! that sits in front of all of them. `html5ever::tree_builder::rules`
//! drives the equivalent logic through its `match_token!` proc-macro; we
//! write the same decision tree as plain `match` arms, one function per
//! mode, called from `TreeBuilder::step`.

use super::types::{InsertionMode, ProcessResult, ReturnMode, Token};
use super::TreeBuilder;
use crate::node::Namespace;
use crate::sets;

impl<'cfg> TreeBuilder<'cfg> {
    pub(crate) fn step(&mut self, mode: InsertionMode, token: &Token) -> ProcessResult {
        if self.is_foreign_content_context(token) {
            return self.step_foreign_content(token);
        }
        if self.is_breakout_context(token) {
            self.break_out_of_foreign_content();
        }
        // `<template>`/`</template>` are handled uniformly regardless of the
        // current insertion mode (§4.5's `InTemplate` row plus the many
        // "process using the rules for InHead" dispatches the full spec
        // scatters across every other mode) — except inside a run of raw
        // text, where a literal `<template>` is just more text content.
        if !matches!(mode, InsertionMode::Text { .. } | InsertionMode::InTableText { .. }) {
            match token {
                Token::StartTag { name, attrs, .. } if name == "template" && !self.is_unsupported(name) => {
                    return self.start_template(attrs);
                },
                Token::EndTag { name } if name == "template" && !self.is_unsupported(name) => {
                    return self.end_template();
                },
                _ => {},
            }
        }
        match mode {
            InsertionMode::InBody => self.step_in_body(token),
            InsertionMode::Text { return_mode } => self.step_text(token, return_mode),
            InsertionMode::InTable => self.step_in_table(token),
            InsertionMode::InTableText { return_mode } => self.step_in_table_text(token, return_mode),
            InsertionMode::InCaption => self.step_in_caption(token),
            InsertionMode::InColumnGroup => self.step_in_column_group(token),
            InsertionMode::InTableBody => self.step_in_table_body(token),
            InsertionMode::InRow => self.step_in_row(token),
            InsertionMode::InCell => self.step_in_cell(token),
            InsertionMode::InTemplate => self.step_in_template(token),
        }
    }

    /// §4.5 "InTemplate": `<template>` content that isn't itself a nested
    /// `<template>`/`</template>` dispatches on the start tag the way the
    /// matching table/body/row insertion mode would, but records the chosen
    /// mode on the template-modes stack instead of switching the live mode
    /// outright — so closing back out of the template resumes whatever mode
    /// the enclosing context was in (ported from
    /// `TreeBuilder::step`'s `InTemplate` arm in the teacher).
    fn step_in_template(&mut self, token: &Token) -> ProcessResult {
        match token {
            Token::StartTag { name, .. }
                if matches!(name.as_str(), "caption" | "colgroup" | "tbody" | "tfoot" | "thead") =>
            {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InTable);
                ProcessResult::Reprocess(InsertionMode::InTable)
            },
            Token::StartTag { name, .. } if name == "col" => {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InColumnGroup);
                ProcessResult::Reprocess(InsertionMode::InColumnGroup)
            },
            Token::StartTag { name, .. } if name == "tr" => {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InTableBody);
                ProcessResult::Reprocess(InsertionMode::InTableBody)
            },
            Token::StartTag { name, .. } if matches!(name.as_str(), "td" | "th") => {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InRow);
                ProcessResult::Reprocess(InsertionMode::InRow)
            },
            Token::Eof => {
                if !self.stack.iter_from_top().any(|id| self.arena.is_html_named(id, "template")) {
                    return ProcessResult::Done;
                }
                self.log_parse_error("unexpected end of input with an open <template>");
                self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, "template"));
                self.afe.clear_to_marker();
                self.template_modes.pop();
                ProcessResult::Reprocess(self.reset_insertion_mode())
            },
            _ => {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InBody);
                ProcessResult::Reprocess(InsertionMode::InBody)
            },
        }
    }

    /// §4.3: entering a `<template>` pushes a marker (so formatting elements
    /// active before it don't reconstruct across the boundary) and a fresh
    /// template insertion mode, exactly like `<applet>`/`<object>`.
    fn start_template(&mut self, attrs: &str) -> ProcessResult {
        self.reconstruct_active_formatting_elements();
        self.insert_html_element("template", attrs);
        self.afe.insert_marker();
        self.template_modes.push(InsertionMode::InTemplate);
        self.set_mode(InsertionMode::InTemplate);
        ProcessResult::Done
    }

    fn end_template(&mut self) -> ProcessResult {
        if !self.stack.iter_from_top().any(|id| self.arena.is_html_named(id, "template")) {
            self.log_parse_error("end tag </template> with no <template> open");
            return ProcessResult::Done;
        }
        self.generate_implied_end_tags(true, None);
        if !self.arena.is_html_named(self.stack.top(), "template") {
            self.log_parse_error("expected current node to be <template> while closing it");
        }
        self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, "template"));
        self.afe.clear_to_marker();
        self.template_modes.pop();
        let next = self.reset_insertion_mode();
        self.set_mode(next);
        ProcessResult::Done
    }

    /// §13.2.6.1 "tree construction dispatcher": once we're inside foreign
    /// content, every token is handled by the foreign-content rules unless
    /// the current node is an HTML/MathML-text/SVG-HTML integration point
    /// and the token is a start tag (other than `mglyph`/`malignmark`) or a
    /// character token — end tags at an integration point still go through
    /// the foreign-content rules, which is what lets them close out a
    /// foreign element by namespace+name instead of being silently dropped
    /// by the HTML-only `any_other_end_tag` — or the token is a start tag
    /// in the breakout set, or it's the last token (EOF always falls
    /// through to the HTML rules).
    fn is_foreign_content_context(&self, token: &Token) -> bool {
        if matches!(token, Token::Eof) {
            return false;
        }
        if self.current_namespace() == Namespace::Html {
            return false;
        }
        if self.is_integration_point(self.stack.top()) {
            match token {
                Token::StartTag { name, .. } if name != "mglyph" && name != "malignmark" => return false,
                Token::Text(_) => return false,
                _ => {},
            }
        }
        if let Token::StartTag { name, attrs, .. } = token {
            if sets::is_breakout_tag(name, attrs) {
                return false;
            }
        }
        true
    }

    /// Mirror image of the breakout carve-out above: `true` exactly when
    /// the current node is foreign (and not an integration point) and the
    /// token is a breakout start tag, i.e. the one case
    /// `is_foreign_content_context` excludes specifically so that the
    /// token falls through to ordinary HTML handling. §13.2.6.3's "any
    /// other start tag" branch for these tags first pops back out of the
    /// foreign subtree before reprocessing.
    fn is_breakout_context(&self, token: &Token) -> bool {
        if self.current_namespace() == Namespace::Html || self.is_integration_point(self.stack.top()) {
            return false;
        }
        matches!(token, Token::StartTag { name, attrs, .. } if sets::is_breakout_tag(name, attrs))
    }

    fn is_integration_point(&self, id: crate::node::NodeId) -> bool {
        sets::is_mathml_text_integration_point(&self.arena, id) || sets::is_html_integration_point(&self.arena, id)
    }

    /// Pop elements off the stack of open elements, flattening each, until
    /// the current node is in the HTML namespace or is an integration
    /// point (§13.2.6.3, the breakout-tag branch of "in foreign content").
    fn break_out_of_foreign_content(&mut self) {
        self.log_parse_error("start tag forces a break out of foreign content");
        while self.current_namespace() != Namespace::Html && !self.is_integration_point(self.stack.top()) {
            let top = self.stack.top();
            self.stack.pop();
            self.arena.flatten(top);
        }
    }

    /// §13.2.6.3 "foreign content" insertion rules, cut down to what
    /// applies outside a scripting/raw-text tokenizer: insert a foreign
    /// element of the current node's namespace for any unmatched start
    /// tag, close back up to (and including) a matching end tag.
    fn step_foreign_content(&mut self, token: &Token) -> ProcessResult {
        match token {
            Token::Text(text) => {
                self.insert_text(text);
                ProcessResult::Done
            },
            Token::StartTag { name, attrs, self_closing } => {
                let ns = self.current_namespace();
                let id = self.insert_foreign_element(ns, name, attrs);
                if *self_closing {
                    self.stack.pop();
                    self.arena.flatten(id);
                }
                ProcessResult::Done
            },
            Token::EndTag { name } => {
                // Pop back to (and including) the nearest open element with
                // this name in the current foreign namespace; if there is
                // none, the end tag is simply ignored (§13.2.6.3 "any other
                // end tag").
                let ns = self.current_namespace();
                let found = self
                    .stack
                    .iter_from_top()
                    .any(|id| self.arena.namespace(id) == ns && self.arena.local_name(id) == name);
                if found {
                    self.stack.pop_until(&mut self.arena, |arena, id| {
                        arena.namespace(id) == ns && arena.local_name(id) == name
                    });
                } else {
                    self.log_parse_error(&format!("unmatched foreign end tag </{name}>"));
                }
                ProcessResult::Done
            },
            Token::Eof => ProcessResult::Done,
        }
    }

    fn step_in_body(&mut self, token: &Token) -> ProcessResult {
        match token {
            Token::Text(text) => {
                self.reconstruct_active_formatting_elements();
                self.insert_text(text);
                ProcessResult::Done
            },
            Token::StartTag { name, attrs, self_closing } => self.start_tag_in_body(name, attrs, *self_closing),
            Token::EndTag { name } => self.end_tag_in_body(name),
            Token::Eof => ProcessResult::Done,
        }
    }

    fn start_tag_in_body(&mut self, name: &str, attrs: &str, self_closing: bool) -> ProcessResult {
        if self.is_unsupported(name) {
            self.log_parse_error(&format!("unsupported element <{name}> degraded to text"));
            self.reconstruct_active_formatting_elements();
            self.insert_text(&crate::dispatcher::escape_as_text(name, attrs, self_closing));
            return ProcessResult::Done;
        }

        if sets::is_formatting_tag(name) && name != "a" {
            self.reconstruct_active_formatting_elements();
            let id = self.insert_html_element(name, attrs);
            self.afe.push(id, name.to_string(), attrs.to_string());
            return ProcessResult::Done;
        }

        match name {
            "p" => {
                if self.tag_in_scope("p", sets::button_scope) {
                    self.close_p_element();
                }
                self.insert_html_element(name, attrs);
                ProcessResult::Done
            },
            "a" => {
                // If there's already an active `<a>` since the last
                // marker, close it out first per the spec's worked "adopt
                // the formatting element" example.
                if let Some((_, existing)) = self.afe.find_recent("a") {
                    self.log_parse_error("start tag <a> while <a> is already active");
                    self.adoption_agency("a");
                    self.afe.remove_node(existing);
                    self.stack.remove(existing);
                }
                self.reconstruct_active_formatting_elements();
                let id = self.insert_html_element(name, attrs);
                self.afe.push(id, name.to_string(), attrs.to_string());
                ProcessResult::Done
            },
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if self.tag_in_scope("p", sets::button_scope) {
                    self.close_p_element();
                }
                if sets::heading_tag(&self.arena, self.stack.top()) {
                    self.log_parse_error("heading start tag nested in another heading");
                    let top = self.stack.top();
                    self.stack.pop();
                    self.arena.flatten(top);
                }
                self.insert_html_element(name, attrs);
                ProcessResult::Done
            },
            "li" => {
                self.close_matching_list_item("li", &["li"]);
                self.insert_html_element(name, attrs);
                ProcessResult::Done
            },
            "dd" | "dt" => {
                self.close_matching_list_item(name, &["dd", "dt"]);
                self.insert_html_element(name, attrs);
                ProcessResult::Done
            },
            "table" => {
                if self.tag_in_scope("p", sets::button_scope) {
                    self.close_p_element();
                }
                self.insert_html_element(name, attrs);
                self.stack.foster_parenting = false;
                self.set_mode(InsertionMode::InTable);
                ProcessResult::Done
            },
            "applet" | "marquee" | "object" => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(name, attrs);
                self.afe.insert_marker();
                ProcessResult::Done
            },
            "style" | "noframes" => {
                self.insert_html_element(name, attrs);
                self.set_mode(InsertionMode::Text { return_mode: ReturnMode::InBody });
                ProcessResult::Done
            },
            "math" => {
                self.reconstruct_active_formatting_elements();
                let id = self.insert_foreign_element(Namespace::MathMl, name, attrs);
                if self_closing {
                    self.stack.pop();
                    self.arena.flatten(id);
                }
                ProcessResult::Done
            },
            "svg" => {
                self.reconstruct_active_formatting_elements();
                let id = self.insert_foreign_element(Namespace::Svg, name, attrs);
                if self_closing {
                    self.stack.pop();
                    self.arena.flatten(id);
                }
                ProcessResult::Done
            },
            _ if sets::is_void_element(name) => {
                self.reconstruct_active_formatting_elements();
                let id = self.insert_html_element(name, attrs);
                self.stack.pop();
                self.arena.flatten(id);
                ProcessResult::Done
            },
            _ => {
                if sets::special_tag_name_closes_p(name) && self.tag_in_scope("p", sets::button_scope) {
                    self.close_p_element();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(name, attrs);
                ProcessResult::Done
            },
        }
    }

    fn close_matching_list_item(&mut self, name: &str, also_close: &[&str]) {
        for id in self.stack.iter_from_top().collect::<Vec<_>>() {
            if self.arena.is_html_named(id, name) {
                self.generate_implied_end_tags(false, Some(name));
                if !self.arena.is_html_named(self.stack.top(), name) {
                    self.log_parse_error(&format!("expected current node to be <{name}> while closing it"));
                }
                self.stack.pop_until(&mut self.arena, |arena, n| arena.is_html_named(n, name));
                return;
            }
            let other_closes = also_close.iter().any(|n| self.arena.is_html_named(id, n));
            if sets::special_tag(&self.arena, id) && !other_closes {
                return;
            }
        }
    }

    fn end_tag_in_body(&mut self, name: &str) -> ProcessResult {
        if self.is_unsupported(name) {
            self.log_parse_error(&format!("unsupported element </{name}> degraded to text"));
            self.insert_text(&format!("&lt;/{name}&gt;"));
            return ProcessResult::Done;
        }
        if sets::is_formatting_tag(name) {
            self.adoption_agency(name);
            return ProcessResult::Done;
        }
        if name == "p" {
            if !self.tag_in_scope("p", sets::button_scope) {
                self.log_parse_error("end tag </p> with no <p> in button scope");
                self.insert_html_element("p", "");
            }
            self.close_p_element();
            return ProcessResult::Done;
        }
        if matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") {
            if !self.stack.iter_from_top().any(|id| sets::heading_tag(&self.arena, id)) {
                self.log_parse_error("end heading tag with no heading in scope");
                return ProcessResult::Done;
            }
            self.generate_implied_end_tags(false, None);
            self.stack.pop_until(&mut self.arena, |arena, id| sets::heading_tag(arena, id));
            return ProcessResult::Done;
        }
        if matches!(name, "applet" | "marquee" | "object") {
            if !self.tag_in_scope(name, sets::default_scope) {
                self.log_parse_error(&format!("end tag </{name}> with no matching element in scope"));
                return ProcessResult::Done;
            }
            self.generate_implied_end_tags(false, None);
            if !self.arena.is_html_named(self.stack.top(), name) {
                self.log_parse_error(&format!("expected current node to be <{name}> while closing it"));
            }
            self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, name));
            self.afe.clear_to_marker();
            return ProcessResult::Done;
        }
        // §4.2: `</li>` is checked against list-item scope specifically, not
        // the default scope `any_other_end_tag` uses — an enclosing `<ol>`/
        // `<ul>` must block the search the same way `<table>`/`<button>` do,
        // so a stray `</li>` can't reach out past its own list.
        if name == "li" {
            if !self.tag_in_scope("li", sets::list_item_scope) {
                self.log_parse_error("end tag </li> with no <li> in list-item scope");
                return ProcessResult::Done;
            }
            self.generate_implied_end_tags(false, Some("li"));
            if !self.arena.is_html_named(self.stack.top(), "li") {
                self.log_parse_error("expected current node to be <li> while closing it");
            }
            self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, "li"));
            return ProcessResult::Done;
        }
        self.any_other_end_tag(name);
        ProcessResult::Done
    }

    /// §4.5 "any other end tag" — the generic fallback that pops a matching
    /// element off the stack, also used by the adoption agency (§4.4 step 4)
    /// when the subject names no active formatting element at all.
    pub(crate) fn any_other_end_tag(&mut self, name: &str) {
        if !self.tag_in_scope(name, sets::default_scope) {
            self.log_parse_error(&format!("end tag </{name}> with no matching element in scope"));
            return;
        }
        self.generate_implied_end_tags(false, Some(name));
        if !self.arena.is_html_named(self.stack.top(), name) {
            self.log_parse_error(&format!("expected current node to be <{name}> while closing it"));
        }
        self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, name));
    }

    /// §4.5 "Text": collects a run of character data opened by a raw-text
    /// placeholder (`<style>`/`<noframes>`, the only two this engine still
    /// recognizes — see Non-goals). A matching end tag pops the element and
    /// resumes `return_mode`; anything else reached here is a literal start
    /// tag our dispatcher already tokenized out of what would, in a real
    /// raw-text tokenizer state, have stayed plain text, so it's spliced
    /// back in verbatim rather than interpreted as markup.
    fn step_text(&mut self, token: &Token, return_mode: ReturnMode) -> ProcessResult {
        match token {
            Token::Text(text) => {
                self.insert_text(text);
                ProcessResult::Done
            },
            Token::EndTag { .. } => {
                let top = self.stack.top();
                self.stack.pop();
                self.arena.flatten(top);
                self.set_mode(return_mode.into());
                ProcessResult::Done
            },
            Token::StartTag { name, attrs, self_closing } => {
                let raw = format!("<{name}{attrs}{}>", if *self_closing { "/" } else { "" });
                self.insert_text(&raw);
                ProcessResult::Done
            },
            Token::Eof => {
                self.log_parse_error("unexpected end of input inside raw text element");
                let top = self.stack.top();
                self.stack.pop();
                self.arena.flatten(top);
                ProcessResult::Reprocess(return_mode.into())
            },
        }
    }

    fn step_in_table(&mut self, token: &Token) -> ProcessResult {
        match token {
            Token::StartTag { name, attrs, .. } if name == "caption" => {
                self.clear_stack_to_table_context();
                self.afe.insert_marker();
                self.insert_html_element(name, attrs);
                self.set_mode(InsertionMode::InCaption);
                ProcessResult::Done
            },
            Token::StartTag { name, attrs, .. } if name == "colgroup" => {
                self.clear_stack_to_table_context();
                self.insert_html_element(name, attrs);
                self.set_mode(InsertionMode::InColumnGroup);
                ProcessResult::Done
            },
            Token::StartTag { name, .. } if name == "col" => {
                self.clear_stack_to_table_context();
                self.insert_html_element("colgroup", "");
                ProcessResult::Reprocess(InsertionMode::InColumnGroup)
            },
            Token::StartTag { name, attrs, .. }
                if matches!(name.as_str(), "tbody" | "tfoot" | "thead") =>
            {
                self.clear_stack_to_table_context();
                self.insert_html_element(name, attrs);
                self.set_mode(InsertionMode::InTableBody);
                ProcessResult::Done
            },
            Token::StartTag { name, .. } if matches!(name.as_str(), "tr" | "td" | "th") => {
                self.clear_stack_to_table_context();
                self.insert_html_element("tbody", "");
                ProcessResult::Reprocess(InsertionMode::InTableBody)
            },
            Token::StartTag { name, .. } if name == "table" => {
                self.log_parse_error("nested <table> start tag");
                if self.tag_in_scope("table", sets::table_scope) {
                    self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, "table"));
                    ProcessResult::Reprocess(self.reset_insertion_mode())
                } else {
                    ProcessResult::Done
                }
            },
            Token::EndTag { name } if name == "table" => {
                if !self.tag_in_scope("table", sets::table_scope) {
                    self.log_parse_error("end tag </table> with no <table> in scope");
                    return ProcessResult::Done;
                }
                self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, "table"));
                ProcessResult::Reprocess(self.reset_insertion_mode())
            },
            Token::EndTag { name }
                if matches!(
                    name.as_str(),
                    "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th"
                        | "thead" | "tr"
                ) =>
            {
                self.log_parse_error(&format!("end tag </{name}> ignored in table context"));
                ProcessResult::Done
            },
            Token::Text(_) => self.step_in_table_text_entry(token, ReturnMode::InTable),
            _ => {
                self.log_parse_error("foster-parented content inside <table>");
                self.stack.foster_parenting = true;
                let result = self.step_in_body(token);
                self.stack.foster_parenting = false;
                result
            },
        }
    }

    fn step_in_table_text_entry(&mut self, token: &Token, return_mode: ReturnMode) -> ProcessResult {
        self.set_mode(InsertionMode::InTableText { return_mode });
        self.step(InsertionMode::InTableText { return_mode }, token)
    }

    /// §3 "Pending table text" / §4.5 "Text coalescing in tables": buffer
    /// character tokens rather than inserting them as they arrive, since
    /// whether they end up foster-parented depends retroactively on whether
    /// the *whole* run turns out to be whitespace-only.
    fn step_in_table_text(&mut self, token: &Token, return_mode: ReturnMode) -> ProcessResult {
        match token {
            Token::Text(text) => {
                self.pending_table_text.push_str(text);
                ProcessResult::Done
            },
            _ => {
                self.flush_pending_table_text();
                ProcessResult::Reprocess(return_mode.into())
            },
        }
    }

    /// §4.6: whitespace-only pending table text is inserted at the current
    /// node in place; a run containing any non-whitespace character is
    /// reprocessed as InBody text with foster-parenting turned on, exactly
    /// like the "anything else" branch of InTable itself.
    fn flush_pending_table_text(&mut self) {
        let text = std::mem::take(&mut self.pending_table_text);
        if text.is_empty() {
            return;
        }
        if text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')) {
            self.insert_text(&text);
            return;
        }
        self.log_parse_error("non-whitespace character data foster-parented out of <table>");
        self.stack.foster_parenting = true;
        self.step_in_body(&Token::Text(text));
        self.stack.foster_parenting = false;
    }

    fn step_in_caption(&mut self, token: &Token) -> ProcessResult {
        match token {
            Token::EndTag { name } if name == "caption" => {
                if !self.tag_in_scope("caption", sets::table_scope) {
                    self.log_parse_error("end tag </caption> with no <caption> in scope");
                    return ProcessResult::Done;
                }
                self.generate_implied_end_tags(false, None);
                self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, "caption"));
                self.afe.clear_to_marker();
                ProcessResult::Reprocess(InsertionMode::InTable)
            },
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                ) =>
            {
                if !self.tag_in_scope("caption", sets::table_scope) {
                    self.log_parse_error("table content while no <caption> in scope");
                    return ProcessResult::Done;
                }
                self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, "caption"));
                self.afe.clear_to_marker();
                ProcessResult::Reprocess(InsertionMode::InTable)
            },
            _ => self.step_in_body(token),
        }
    }

    fn step_in_column_group(&mut self, token: &Token) -> ProcessResult {
        match token {
            Token::StartTag { name, attrs, self_closing } if name == "col" => {
                let id = self.insert_html_element(name, attrs);
                if *self_closing {
                    self.stack.pop();
                    self.arena.flatten(id);
                }
                ProcessResult::Done
            },
            Token::EndTag { name } if name == "colgroup" => {
                if !self.arena.is_html_named(self.stack.top(), "colgroup") {
                    self.log_parse_error("end tag </colgroup> with no <colgroup> as current node");
                    return ProcessResult::Done;
                }
                let top = self.stack.top();
                self.stack.pop();
                self.arena.flatten(top);
                ProcessResult::Reprocess(InsertionMode::InTable)
            },
            _ => {
                if !self.arena.is_html_named(self.stack.top(), "colgroup") {
                    return ProcessResult::Done;
                }
                let top = self.stack.top();
                self.stack.pop();
                self.arena.flatten(top);
                ProcessResult::Reprocess(InsertionMode::InTable)
            },
        }
    }

    fn step_in_table_body(&mut self, token: &Token) -> ProcessResult {
        match token {
            Token::StartTag { name, attrs, .. } if name == "tr" => {
                self.clear_stack_to_table_body_context();
                self.insert_html_element(name, attrs);
                self.set_mode(InsertionMode::InRow);
                ProcessResult::Done
            },
            Token::StartTag { name, .. } if matches!(name.as_str(), "th" | "td") => {
                self.log_parse_error("<th>/<td> without an enclosing <tr>");
                self.clear_stack_to_table_body_context();
                self.insert_html_element("tr", "");
                ProcessResult::Reprocess(InsertionMode::InRow)
            },
            Token::EndTag { name } if matches!(name.as_str(), "tbody" | "tfoot" | "thead") => {
                if !self.tag_in_scope(name, sets::table_scope) {
                    self.log_parse_error(&format!("end tag </{name}> with no matching section in scope"));
                    return ProcessResult::Done;
                }
                self.clear_stack_to_table_body_context();
                let top = self.stack.top();
                self.stack.pop();
                self.arena.flatten(top);
                ProcessResult::Reprocess(InsertionMode::InTable)
            },
            Token::StartTag { name, .. }
                if matches!(name.as_str(), "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead") =>
            {
                if !self.stack.iter_from_top().any(|id| {
                    matches!(self.arena.local_name(id), "tbody" | "tfoot" | "thead")
                        && self.arena.namespace(id) == Namespace::Html
                }) {
                    return ProcessResult::Done;
                }
                self.clear_stack_to_table_body_context();
                let top = self.stack.top();
                self.stack.pop();
                self.arena.flatten(top);
                ProcessResult::Reprocess(InsertionMode::InTable)
            },
            Token::EndTag { name } if name == "table" => ProcessResult::Reprocess(InsertionMode::InTable),
            _ => self.step_in_table(token),
        }
    }

    fn step_in_row(&mut self, token: &Token) -> ProcessResult {
        match token {
            Token::StartTag { name, attrs, .. } if matches!(name.as_str(), "th" | "td") => {
                self.clear_stack_to_table_row_context();
                self.insert_html_element(name, attrs);
                self.set_mode(InsertionMode::InCell);
                self.afe.insert_marker();
                ProcessResult::Done
            },
            Token::EndTag { name } if name == "tr" => {
                if !self.tag_in_scope("tr", sets::table_scope) {
                    self.log_parse_error("end tag </tr> with no <tr> in scope");
                    return ProcessResult::Done;
                }
                self.clear_stack_to_table_row_context();
                let top = self.stack.top();
                self.stack.pop();
                self.arena.flatten(top);
                ProcessResult::Reprocess(InsertionMode::InTableBody)
            },
            Token::StartTag { name, .. }
                if matches!(name.as_str(), "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr") =>
            {
                if !self.tag_in_scope("tr", sets::table_scope) {
                    return ProcessResult::Done;
                }
                self.clear_stack_to_table_row_context();
                let top = self.stack.top();
                self.stack.pop();
                self.arena.flatten(top);
                ProcessResult::Reprocess(InsertionMode::InTableBody)
            },
            Token::EndTag { name } if matches!(name.as_str(), "tbody" | "tfoot" | "thead") => {
                if !self.tag_in_scope(name, sets::table_scope) {
                    return ProcessResult::Done;
                }
                self.clear_stack_to_table_row_context();
                let top = self.stack.top();
                self.stack.pop();
                self.arena.flatten(top);
                ProcessResult::Reprocess(InsertionMode::InTableBody)
            },
            Token::EndTag { name } if name == "table" => ProcessResult::Reprocess(InsertionMode::InTableBody),
            _ => self.step_in_table(token),
        }
    }

    fn step_in_cell(&mut self, token: &Token) -> ProcessResult {
        match token {
            Token::EndTag { name } if matches!(name.as_str(), "td" | "th") => {
                if !self.tag_in_scope(name, sets::table_scope) {
                    self.log_parse_error(&format!("end tag </{name}> with no matching cell in scope"));
                    return ProcessResult::Done;
                }
                self.generate_implied_end_tags(false, None);
                self.stack.pop_until(&mut self.arena, |arena, id| arena.is_html_named(id, name));
                self.afe.clear_to_marker();
                ProcessResult::Reprocess(InsertionMode::InRow)
            },
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                ) =>
            {
                if !self.tag_in_scope("td", sets::table_scope) && !self.tag_in_scope("th", sets::table_scope) {
                    return ProcessResult::Done;
                }
                self.close_current_cell();
                ProcessResult::Reprocess(InsertionMode::InRow)
            },
            Token::EndTag { name } if matches!(name.as_str(), "table" | "tbody" | "tfoot" | "thead" | "tr") => {
                if !self.tag_in_scope("td", sets::table_scope) && !self.tag_in_scope("th", sets::table_scope) {
                    return ProcessResult::Done;
                }
                self.close_current_cell();
                ProcessResult::Reprocess(InsertionMode::InRow)
            },
            _ => self.step_in_body(token),
        }
    }

    fn close_current_cell(&mut self) {
        self.generate_implied_end_tags(false, None);
        self.stack
            .pop_until(&mut self.arena, |arena, id| matches!(arena.local_name(id), "td" | "th"));
        self.afe.clear_to_marker();
        self.set_mode(InsertionMode::InRow);
    }

    fn clear_stack_to_table_context(&mut self) {
        while !sets::table_scope(&self.arena, self.stack.top()) {
            let top = self.stack.top();
            self.stack.pop();
            self.arena.flatten(top);
        }
    }

    fn clear_stack_to_table_body_context(&mut self) {
        while !matches!(self.arena.local_name(self.stack.top()), "tbody" | "tfoot" | "thead" | "html" | "template") {
            let top = self.stack.top();
            self.stack.pop();
            self.arena.flatten(top);
        }
    }

    fn clear_stack_to_table_row_context(&mut self) {
        while !matches!(self.arena.local_name(self.stack.top()), "tr" | "html" | "template") {
            let top = self.stack.top();
            self.stack.pop();
            self.arena.flatten(top);
        }
    }

    /// §4.5 "reset the insertion mode appropriately", cut down to the modes
    /// this engine reaches: walk down from the current node looking for a
    /// table-structure element and switch to its mode, defaulting to
    /// `InBody` once none apply.
    fn reset_insertion_mode(&self) -> InsertionMode {
        for id in self.stack.iter_from_top() {
            match self.arena.local_name(id) {
                "td" | "th" if self.arena.namespace(id) == Namespace::Html => return InsertionMode::InCell,
                "tr" => return InsertionMode::InRow,
                "tbody" | "thead" | "tfoot" => return InsertionMode::InTableBody,
                "caption" => return InsertionMode::InCaption,
                "colgroup" => return InsertionMode::InColumnGroup,
                "table" => return InsertionMode::InTable,
                "template" => {
                    return self.template_modes.last().copied().unwrap_or(InsertionMode::InBody);
                },
                _ => {},
            }
        }
        InsertionMode::InBody
    }
}

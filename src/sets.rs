// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Static element-classification tables.
//!
//! `html5ever::tree_builder` keeps an analogous `tag_sets` module: small
//! `Fn(ExpandedName) -> bool` predicates built by a `declare_tag_set!`
//! macro, backed by `phf` static sets for anything bigger than a handful of
//! names. We keep both the macro and the `phf` backing here, adapted to
//! operate on `(Arena, NodeId)` instead of a generic `ExpandedName`, since a
//! couple of our predicates (the two integration-point checks) need to look
//! at attributes, not just the element's name.

use crate::node::{Arena, Namespace, NodeId};

/// Build a `fn(&Arena, NodeId) -> bool` that matches HTML-namespace
/// elements by local name, optionally subtracting names from a base set —
/// mirrors the two `declare_tag_set!` forms `html5ever`'s tree builder uses
/// (`= "a" "b" ...` and `= [base] - "a" "b" ...`).
macro_rules! declare_tag_set {
    ($name:ident = $($tag:literal)+) => {
        pub(crate) fn $name(arena: &Arena, id: NodeId) -> bool {
            arena.namespace(id) == Namespace::Html
                && matches!(arena.local_name(id), $($tag)|+)
        }
    };
    ($name:ident = [$base:ident] - $($tag:literal)+) => {
        pub(crate) fn $name(arena: &Arena, id: NodeId) -> bool {
            $base(arena, id) && !matches!(arena.local_name(id), $($tag)|+)
        }
    };
}

// Void (empty) elements: never emit a close tag, never have children.
static VOID_ELEMENTS: phf::Set<&'static str> = phf::phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
    "basefont", "bgsound", "frame", "keygen",
};

pub(crate) fn is_void_element(local_name: &str) -> bool {
    VOID_ELEMENTS.contains(local_name)
}

// The HTML5 "special" category (https://html.spec.whatwg.org/#special), used
// to find the adoption agency's furthest block and to decide when a block
// element must close an open `<p>`.
declare_tag_set!(html_special =
    "address" "applet" "area" "article" "aside" "base" "basefont" "bgsound"
    "blockquote" "body" "br" "button" "caption" "center" "col" "colgroup"
    "dd" "details" "dir" "div" "dl" "dt" "embed" "fieldset" "figcaption"
    "figure" "footer" "form" "frame" "frameset" "h1" "h2" "h3" "h4" "h5" "h6"
    "head" "header" "hgroup" "hr" "html" "iframe" "img" "input" "isindex"
    "li" "link" "listing" "main" "marquee" "menu" "meta" "nav" "noembed"
    "noframes" "noscript" "object" "ol" "p" "param" "plaintext" "pre"
    "script" "section" "select" "source" "style" "summary" "table" "tbody"
    "td" "template" "textarea" "tfoot" "th" "thead" "title" "tr" "track"
    "ul" "wbr" "xmp"
);

pub(crate) fn special_tag(arena: &Arena, id: NodeId) -> bool {
    html_special(arena, id) || is_mathml_text_integration_point(arena, id) || {
        let ns = arena.namespace(id);
        ns == Namespace::MathMl && arena.local_name(id) == "annotation-xml"
    } || {
        let ns = arena.namespace(id);
        ns == Namespace::Svg && matches!(arena.local_name(id), "foreignObject" | "desc" | "title")
    }
}

declare_tag_set!(heading_tag = "h1" "h2" "h3" "h4" "h5" "h6");

declare_tag_set!(cursory_implied_end =
    "dd" "dt" "li" "optgroup" "option" "p" "rb" "rp" "rt" "rtc"
);

// `declare_tag_set!`'s subtractive form only removes names; thorough end
// tags *add* the table-structure names on top of the cursory set instead,
// so this one is built directly rather than through the macro.
pub(crate) fn thorough_implied_end_tags(arena: &Arena, id: NodeId) -> bool {
    cursory_implied_end(arena, id)
        || (arena.namespace(id) == Namespace::Html
            && matches!(
                arena.local_name(id),
                "caption" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
            ))
}

declare_tag_set!(table_scope = "html" "table" "template");

declare_tag_set!(foster_target = "table" "tbody" "tfoot" "thead" "tr");

declare_tag_set!(html_default_scope =
    "applet" "caption" "html" "marquee" "object" "table" "td" "template" "th"
);

pub(crate) fn default_scope(arena: &Arena, id: NodeId) -> bool {
    html_default_scope(arena, id)
        || is_mathml_text_integration_point(arena, id)
        || is_html_integration_point(arena, id)
}

pub(crate) fn list_item_scope(arena: &Arena, id: NodeId) -> bool {
    default_scope(arena, id)
        || (arena.namespace(id) == Namespace::Html
            && matches!(arena.local_name(id), "ol" | "ul"))
}

pub(crate) fn button_scope(arena: &Arena, id: NodeId) -> bool {
    default_scope(arena, id) || arena.is_html_named(id, "button")
}

/// Block-level start tags that implicitly close an open `<p>` in button
/// scope before opening (§4.5's "InBody" start-tag rules, the long list of
/// `addess, article, aside, ...` arms that all do "if in button scope,
/// close a p element").
pub(crate) fn special_tag_name_closes_p(name: &str) -> bool {
    matches!(
        name,
        "address" | "article" | "aside" | "blockquote" | "center" | "details" | "dialog" | "dir"
            | "div" | "dl" | "fieldset" | "figcaption" | "figure" | "footer" | "header" | "hgroup"
            | "hr" | "listing" | "main" | "menu" | "nav" | "ol" | "p" | "pre" | "section"
            | "summary" | "table" | "ul"
    )
}

/// Adoption-agency-triggering formatting elements (§4.4). Checked against a
/// raw tag name, since it's tested before any node exists (on an end tag).
pub(crate) fn is_formatting_tag(name: &str) -> bool {
    matches!(
        name,
        "a" | "b" | "big" | "code" | "em" | "font" | "i" | "nobr" | "s" | "small" | "strike"
            | "strong" | "tt" | "u"
    )
}

/// The foreign-content "breakout" set (§4.5): HTML-like tags that force a
/// foreign-content stack to pop back to an HTML context before reprocessing.
pub(crate) fn is_breakout_tag(name: &str, attrs: &str) -> bool {
    if matches!(
        name,
        "b" | "big" | "blockquote" | "body" | "br" | "center" | "code" | "dd" | "div" | "dl"
            | "dt" | "em" | "embed" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "head" | "hr"
            | "i" | "img" | "li" | "listing" | "menu" | "meta" | "nobr" | "ol" | "p" | "pre"
            | "ruby" | "s" | "small" | "span" | "strong" | "strike" | "sub" | "sup" | "table"
            | "tt" | "u" | "ul" | "var"
    ) {
        return true;
    }
    name == "font"
        && (crate::attrs::attr_value(attrs, "color").is_some()
            || crate::attrs::attr_value(attrs, "face").is_some()
            || crate::attrs::attr_value(attrs, "size").is_some())
}

/// MathML text integration point: `mi mo mn ms mtext` in the MathML
/// namespace (§4.1).
pub(crate) fn is_mathml_text_integration_point(arena: &Arena, id: NodeId) -> bool {
    arena.namespace(id) == Namespace::MathMl
        && matches!(arena.local_name(id), "mi" | "mo" | "mn" | "ms" | "mtext")
}

/// HTML integration point: SVG `foreignObject desc title`, or MathML
/// `annotation-xml` with `encoding` equal to `text/html` or
/// `application/xhtml+xml` (case-insensitive) (§4.1).
pub(crate) fn is_html_integration_point(arena: &Arena, id: NodeId) -> bool {
    match arena.namespace(id) {
        Namespace::Svg => matches!(arena.local_name(id), "foreignObject" | "desc" | "title"),
        Namespace::MathMl if arena.local_name(id) == "annotation-xml" => {
            crate::attrs::attr_value(arena.attrs(id), "encoding")
                .map(|v| v.eq_ignore_ascii_case("text/html") || v.eq_ignore_ascii_case("application/xhtml+xml"))
                .unwrap_or(false)
        },
        _ => false,
    }
}

/// Elements that are always rejected outright regardless of any allow-list
/// configuration (§1 Non-goals). Building a `Balancer` with an
/// `allowed_html_elements` set overlapping this list is a configuration
/// error (§6).
pub(crate) const UNSUPPORTED_ELEMENTS: &[&str] = &[
    "html", "head", "body", "frameset", "form", "frame", "plaintext", "isindex", "textarea",
    "xmp", "iframe", "noembed", "noscript", "select", "script", "title",
];

pub(crate) fn is_unsupported_element(name: &str) -> bool {
    UNSUPPORTED_ELEMENTS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with(namespace: Namespace, name: &str) -> (Arena, NodeId) {
        let mut arena = Arena::new();
        let id = arena.create_element(namespace, name, "");
        (arena, id)
    }

    #[test]
    fn void_elements_recognized() {
        assert!(is_void_element("br"));
        assert!(!is_void_element("div"));
    }

    #[test]
    fn special_tag_covers_html_and_foreign_integration_points() {
        let (arena, div) = arena_with(Namespace::Html, "div");
        assert!(special_tag(&arena, div));

        let (arena, mi) = arena_with(Namespace::MathMl, "mi");
        assert!(special_tag(&arena, mi));

        let (arena, span) = arena_with(Namespace::Html, "span");
        assert!(!special_tag(&arena, span));
    }

    #[test]
    fn default_scope_stops_at_table() {
        let (arena, table) = arena_with(Namespace::Html, "table");
        assert!(default_scope(&arena, table));
        assert!(list_item_scope(&arena, table));
        assert!(button_scope(&arena, table));
    }

    #[test]
    fn breakout_set_includes_conditional_font() {
        assert!(is_breakout_tag("div", ""));
        assert!(!is_breakout_tag("font", ""));
        assert!(is_breakout_tag("font", r#" color="red""#));
    }
}

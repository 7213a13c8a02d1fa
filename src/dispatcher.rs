// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Turns the canonical input string into a stream of [`Token`]s for the
//! tree builder (§4.6). `html5ever`'s own tokenizer is a hand-written state
//! machine operating on raw bytes because it has to support every HTML5
//! tokenizer state (RCDATA, script-data-escaped, character references,
//! …). This engine's input is already-sanitized, already-normalized markup
//! with a fixed attribute grammar, so recognizing tags is a linear regex
//! scan rather than a full tokenizer — the same trade other sanitizer-
//! adjacent crates in this space make once they control the input shape.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use crate::tree_builder::types::Token;

/// Matches one HTML tag: `<tag attrs>`, `</tag>`, or `<tag attrs/>`. The
/// attribute group reuses the canonical `(" " NAME "=" '"' VALUE '"')*`
/// grammar from §6, so it only ever matches already-normalized attributes
/// rather than arbitrary HTML attribute syntax.
fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?x)
            <(?P<close>/)?
            (?P<name>[a-zA-Z][a-zA-Z0-9:-]*)
            (?P<attrs>(?:\s+[a-zA-Z_:][-a-zA-Z0-9_:.]*="[^"]*")*)
            \s*(?P<selfclose>/)?>
            "#,
        )
        .expect("static tag pattern is valid")
    })
}

/// Check `text` against the input contract (§6) that strict mode asserts
/// rather than silently tolerates: no null bytes, and no `<` that fails to
/// begin a recognized tag (the sanitizer upstream is supposed to have
/// entity-escaped any such `<` already). Attribute-string canonicalization
/// is covered for free: a tag whose attributes don't match the canonical
/// `(" " NAME "=" '"' VALUE '"')*` grammar simply fails to match as a tag
/// here, which surfaces as exactly this same stray-`<` violation.
pub(crate) fn check_strict_contract(text: &str) -> Result<(), String> {
    if text.contains('\0') {
        return Err("input contains a null byte".to_string());
    }
    let pattern = tag_pattern();
    let mut last_end = 0;
    for m in pattern.find_iter(text) {
        if let Some(offset) = text[last_end..m.start()].find('<') {
            return Err(format!(
                "stray '<' at byte offset {} does not begin a recognized tag and was not entity-escaped",
                last_end + offset
            ));
        }
        last_end = m.end();
    }
    if let Some(offset) = text[last_end..].find('<') {
        return Err(format!(
            "stray '<' at byte offset {} does not begin a recognized tag and was not entity-escaped",
            last_end + offset
        ));
    }
    Ok(())
}

/// Split `text` into a stream of tokens, in source order, ending with a
/// single `Token::Eof`.
pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    let pattern = tag_pattern();
    let mut tokens = Vec::new();
    let mut last_end = 0;

    for m in pattern.find_iter(text) {
        if m.start() > last_end {
            // A stray `<`/`>`/`&` here is something that failed to match
            // the tag grammar (§6: "unbalanced `<`/`>`"); escape it so it
            // survives round-tripping through the serializer as literal
            // text instead of corrupting the output markup.
            tokens.push(Token::Text(escape_text(&text[last_end..m.start()])));
        }
        let caps = pattern
            .captures(&text[m.start()..m.end()])
            .expect("find_iter match always captures");
        let name = caps.name("name").unwrap().as_str().to_ascii_lowercase();
        let attrs = caps.name("attrs").map(|a| a.as_str().to_string()).unwrap_or_default();
        if caps.name("close").is_some() {
            tokens.push(Token::EndTag { name });
        } else {
            let self_closing = caps.name("selfclose").is_some();
            tokens.push(Token::StartTag { name, attrs, self_closing });
        }
        last_end = m.end();
    }
    if last_end < text.len() {
        tokens.push(Token::Text(escape_text(&text[last_end..])));
    }
    tokens.push(Token::Eof);
    tokens
}

/// Reconstruct an unsupported or malformed tag as literal, HTML-escaped
/// text (§4.6 and §6: unsupported elements "degrade to their textual
/// representation" rather than vanishing or aborting the parse in
/// non-strict mode).
pub(crate) fn escape_as_text(name: &str, attrs: &str, self_closing: bool) -> String {
    let mut out = String::new();
    let _ = write!(out, "&lt;{name}");
    for (attr_name, value) in crate::attrs::iter_attrs(attrs) {
        let _ = write!(out, " {attr_name}=\"{}\"", escape_text(value));
    }
    if self_closing {
        out.push('/');
    }
    out.push_str("&gt;");
    out
}

/// §4.6: escape unbalanced `<`/`>` only. Unlike a general-purpose HTML
/// escaper, this does *not* also rewrite `&` — the input contract (§6)
/// guarantees entities are already canonical, and rewriting `&` here would
/// double-escape the engine's own output (`&lt;` → `&amp;lt;`) on a second
/// `balance` pass, violating the §8 idempotence invariant.
fn escape_text(s: &str) -> String {
    s.replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_text_and_tags() {
        let tokens = tokenize(r#"a<b class="x">c</b>d"#);
        assert!(matches!(&tokens[0], Token::Text(t) if t == "a"));
        assert!(matches!(&tokens[1], Token::StartTag { name, attrs, self_closing }
            if name == "b" && attrs == r#" class="x""# && !self_closing));
        assert!(matches!(&tokens[2], Token::Text(t) if t == "c"));
        assert!(matches!(&tokens[3], Token::EndTag { name } if name == "b"));
        assert!(matches!(&tokens[4], Token::Text(t) if t == "d"));
        assert!(matches!(&tokens[5], Token::Eof));
    }

    #[test]
    fn recognizes_self_closing_tags() {
        let tokens = tokenize(r#"<br/>"#);
        assert!(matches!(&tokens[0], Token::StartTag { name, self_closing, .. }
            if name == "br" && *self_closing));
    }

    #[test]
    fn escapes_unsupported_tag_as_text() {
        let text = escape_as_text("script", r#" src="x""#, false);
        assert_eq!(text, r#"&lt;script src="x"&gt;"#);
    }

    #[test]
    fn strict_contract_accepts_well_formed_input() {
        assert!(check_strict_contract(r#"a<b class="x">c</b>d"#).is_ok());
    }

    #[test]
    fn strict_contract_rejects_stray_angle_bracket() {
        assert!(check_strict_contract("a < b").is_err());
    }

    #[test]
    fn strict_contract_rejects_null_byte() {
        assert!(check_strict_contract("a\0b").is_err());
    }
}

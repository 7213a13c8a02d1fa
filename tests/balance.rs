// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end tests against the public `Balancer::balance` API, mirroring
//! the plain `#[test] fn` style of `rcdom`'s `tests/html-driver.rs` rather
//! than the upstream `html5lib`-corpus harness, which is out of scope here.

use html5_balancer::BalancerBuilder;

fn balance(input: &str) -> String {
    let _ = env_logger::try_init();
    BalancerBuilder::new().build().unwrap().balance(input).unwrap()
}

#[test]
fn adoption_agency_untangles_mismatched_b_i() {
    assert_eq!(balance("<b>1<i>2</b>3</i>"), "<b>1<i>2</i></b><i>3</i>");
}

#[test]
fn block_inside_p_closes_the_paragraph() {
    assert_eq!(balance("<p><div>x</div></p>"), "<p></p><div>x</div><p></p>");
}

#[test]
fn table_foster_parents_non_table_content() {
    assert_eq!(
        balance("<table><b>x</b><tr><td>y</td></tr></table>"),
        "<b>x</b><table><tbody><tr><td>y</td></tr></tbody></table>"
    );
}

#[test]
fn adoption_agency_handles_nested_anchor() {
    assert_eq!(balance("<a>1<a>2</a>3</a>"), "<a>1</a><a>2</a>3");
}

#[test]
fn list_items_get_implied_close_tags() {
    assert_eq!(balance("<ul><li>a<li>b</ul>"), "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn mathml_namespace_is_preserved() {
    assert_eq!(balance("<math><mi>x</mi></math>"), "<math><mi>x</mi></math>");
}

#[test]
fn html_breakout_tag_closes_foreign_content() {
    assert_eq!(balance("<math><p>x</p></math>"), "<math></math><p>x</p>");
}

#[test]
fn unclosed_tags_are_closed_at_end_of_input() {
    assert_eq!(balance("<b>hi"), "<b>hi</b>");
}

#[test]
fn heading_closes_a_previously_open_heading() {
    assert_eq!(balance("<h1>a<h2>b</h2>"), "<h1>a</h1><h2>b</h2>");
}

#[test]
fn applet_reconstructs_formatting_across_its_boundary() {
    // the active `<b>` closes at the </b>, but <applet> starts a marker so
    // nothing reconstructs across it; the dangling <b> at the end reopens.
    assert_eq!(
        balance("<b>x<applet>y</applet>z</b>"),
        "<b>x<applet>y</applet>z</b>"
    );
}

#[test]
fn template_content_is_foster_parented_like_a_table() {
    assert_eq!(
        balance("<table><template><td>1</td></template></table>"),
        "<table><template><td>1</td></template></table>"
    );
}

#[test]
fn style_element_content_is_kept_as_raw_text() {
    assert_eq!(balance("<style>a < b</style>"), "<style>a &lt; b</style>");
}

#[test]
fn unsupported_elements_degrade_to_escaped_text() {
    assert_eq!(balance("<script>alert(1)</script>"), "&lt;script&gt;alert(1)&lt;/script&gt;");
}

#[test]
fn allowed_html_elements_restricts_the_output_vocabulary() {
    let balancer = BalancerBuilder::new()
        .allowed_html_elements(["p".to_string()])
        .build()
        .unwrap();
    assert_eq!(balancer.balance("<p><b>x</b></p>").unwrap(), "<p>&lt;b&gt;x&lt;/b&gt;</p>");
}

#[test]
fn strict_mode_surfaces_parse_errors() {
    let balancer = BalancerBuilder::new().strict(true).build().unwrap();
    assert!(balancer.balance("</b>").is_err());
}

#[test]
fn non_strict_mode_degrades_unmatched_end_tags_silently() {
    let balancer = BalancerBuilder::new().strict(false).build().unwrap();
    assert_eq!(balancer.balance("</b>").unwrap(), "");
}

#[test]
fn strict_mode_rejects_an_unescaped_stray_angle_bracket() {
    let balancer = BalancerBuilder::new().strict(true).build().unwrap();
    assert!(balancer.balance("1 < 2").is_err());
}

#[test]
fn non_strict_mode_escapes_a_stray_angle_bracket_instead_of_failing() {
    assert_eq!(balance("1 < 2"), "1 &lt; 2");
}

#[test]
fn balance_with_applies_a_postprocessing_hook() {
    let balancer = BalancerBuilder::new().build().unwrap();
    let out = balancer
        .balance_with("<b>hi</b>", |s| *s = s.replace("hi", "bye"))
        .unwrap();
    assert_eq!(out, "<b>bye</b>");
}

#[test]
fn is_idempotent() {
    let once = balance("<b>1<i>2</b>3</i>");
    let twice = balance(&once);
    assert_eq!(once, twice);
}

#[test]
fn escaped_ampersands_do_not_double_escape_on_a_second_pass() {
    let once = balance("<script>alert(1)</script>");
    assert_eq!(once, "&lt;script&gt;alert(1)&lt;/script&gt;");
    let twice = balance(&once);
    assert_eq!(once, twice);
}

#[test]
fn stray_angle_bracket_text_is_idempotent() {
    let once = balance("1 < 2");
    let twice = balance(&once);
    assert_eq!(once, twice);
}

#[test]
fn whitespace_only_table_text_stays_in_place() {
    assert_eq!(balance("<table>  </table>"), "<table>  </table>");
}

#[test]
fn non_whitespace_table_text_is_foster_parented() {
    assert_eq!(balance("<table>x</table>"), "x<table></table>");
}

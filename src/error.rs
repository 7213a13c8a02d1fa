// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types (§7). Configuration failures and per-call balancing
//! failures are kept separate, the way `html5ever`'s sibling crates split
//! `Attribute`-building errors from I/O errors — they're raised at
//! different points in the API and a caller handles them differently.

use thiserror::Error;

/// Returned by [`crate::BalancerBuilder::build`] when the requested
/// configuration can never produce a valid [`crate::Balancer`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `allowed_html_elements` named an element this engine never supports
    /// regardless of configuration (§1 Non-goals): `html`, `script`, etc.
    #[error("element <{0}> is not supported by this engine and cannot be allow-listed")]
    UnsupportedElement(String),
}

/// Returned by [`crate::Balancer::balance`] in strict mode when the input
/// could not be balanced cleanly (§7). In non-strict mode (the default),
/// balancing never fails — malformed input degrades gracefully instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalanceError {
    /// One or more tree-construction parse errors were recorded while
    /// balancing; the message joins them for display.
    #[error("input could not be balanced: {0}")]
    Malformed(String),
    /// The input violated the contract strict mode asserts (§6): a literal
    /// `<` that doesn't begin a recognized tag (and so wasn't entity-escaped
    /// by the upstream sanitizer as the contract requires), or a null byte.
    #[error("input violates the strict-mode input contract: {0}")]
    StrictAssertion(String),
}

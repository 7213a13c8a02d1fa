// Copyright 2013-2025 The html5-balancer Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Public configuration and entry points (§6): a builder that validates
//! once at construction time, handing out an immutable, `Send + Sync`
//! [`Balancer`] that can be called concurrently from independent threads —
//! mirroring how `html5ever::driver::parse_document` takes an options
//! struct up front rather than threading flags through every call.

use std::collections::HashSet;

use crate::dispatcher;
use crate::error::{BalanceError, ConfigError};
use crate::sets;
use crate::tree_builder::TreeBuilder;

pub(crate) struct Config {
    pub(crate) strict: bool,
    pub(crate) allowed_html_elements: Option<HashSet<String>>,
}

/// Builds a [`Balancer`] (§6).
///
/// ```
/// use html5_balancer::BalancerBuilder;
///
/// let balancer = BalancerBuilder::new().strict(false).build().unwrap();
/// assert_eq!(balancer.balance("<b>hi").unwrap(), "<b>hi</b>");
/// ```
#[derive(Default)]
pub struct BalancerBuilder {
    strict: bool,
    allowed_html_elements: Option<HashSet<String>>,
}

impl BalancerBuilder {
    pub fn new() -> Self {
        BalancerBuilder::default()
    }

    /// Non-strict (the default) never fails: malformed input is balanced as
    /// best it can be. Strict mode surfaces a [`BalanceError`] instead once
    /// any parse error was recorded (§7).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Restrict which HTML elements `balance` will keep; anything else is
    /// degraded to escaped text exactly like an always-unsupported element
    /// (§1 Non-goals, §6). `None` (the default) allows every element this
    /// engine supports.
    pub fn allowed_html_elements(mut self, elements: impl IntoIterator<Item = String>) -> Self {
        self.allowed_html_elements = Some(elements.into_iter().collect());
        self
    }

    pub fn build(self) -> Result<Balancer, ConfigError> {
        if let Some(allowed) = &self.allowed_html_elements {
            for name in allowed {
                if sets::is_unsupported_element(name) {
                    return Err(ConfigError::UnsupportedElement(name.clone()));
                }
            }
        }
        Ok(Balancer {
            config: Config {
                strict: self.strict,
                allowed_html_elements: self.allowed_html_elements,
            },
        })
    }
}

/// A reusable, immutable balancing engine (§6). `Balancer` holds only its
/// validated configuration — every [`Balancer::balance`] call builds a
/// fresh arena and tree builder, so the same `Balancer` can be shared
/// across threads (it is `Send + Sync`) and called concurrently.
pub struct Balancer {
    config: Config,
}

impl Balancer {
    /// Balance `text`, returning the normalized, well-formed fragment.
    pub fn balance(&self, text: &str) -> Result<String, BalanceError> {
        self.balance_with(text, |_| {})
    }

    /// Balance `text`, calling `processing` once with the final output
    /// string before it's returned — a hook for last-mile post-processing
    /// (link rewriting, profanity filtering) without a second parse pass.
    pub fn balance_with<F>(&self, text: &str, mut processing: F) -> Result<String, BalanceError>
    where
        F: FnMut(&mut String),
    {
        if self.config.strict {
            dispatcher::check_strict_contract(text).map_err(BalanceError::StrictAssertion)?;
        }
        let mut builder = TreeBuilder::new(&self.config);
        for token in dispatcher::tokenize(text) {
            builder.process(token);
        }
        let mut output = builder.finish()?;
        processing(&mut output);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_allow_listed_element() {
        let err = BalancerBuilder::new()
            .allowed_html_elements(["script".to_string()])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedElement("script".to_string()));
    }

    #[test]
    fn default_builder_accepts_ordinary_elements() {
        let balancer = BalancerBuilder::new()
            .allowed_html_elements(["b".to_string(), "p".to_string()])
            .build()
            .unwrap();
        assert!(balancer.balance("hi").is_ok());
    }
}

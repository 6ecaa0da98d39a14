/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The request-scoped "current context" slot.
//!
//! Nested producers discover their container by reading the slot instead of
//! being handed it explicitly. The slot lives in an [`EncodingHost`] that is
//! passed by reference through every producer call; there is no global
//! state. Producers use it in stack discipline: [`enter`] saves the prior
//! value and [`exit`] restores it.

use quarto_encoding::{Guarantee, MediaType, ValidMediaInput};
use tracing::{debug, trace};

use crate::config::PipelineConfig;
use crate::error::Result;

/// The media type output is currently being produced in, together with
/// what the sink receiving it already validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub content_type: MediaType,
    pub valid_input: Guarantee,
}

impl RequestContext {
    /// Context for bodies whose output is dropped. Nested producers see a
    /// plain text container that accepts anything.
    pub const DISCARD: RequestContext = RequestContext {
        content_type: MediaType::Text,
        valid_input: Guarantee::Discard,
    };

    pub fn new(content_type: MediaType, valid_input: Guarantee) -> Self {
        debug_assert!(
            valid_input.accepts_without_extra_work(content_type),
            "{valid_input:?} does not validate {content_type}"
        );
        Self {
            content_type,
            valid_input,
        }
    }

    /// A context whose sink validates exactly its own content type.
    pub fn validating(content_type: MediaType) -> Self {
        Self::new(content_type, Guarantee::Validating(content_type))
    }

    pub fn is_discard(&self) -> bool {
        self.valid_input == Guarantee::Discard
    }
}

/// Request-scoped state the pipeline needs from its environment.
pub trait EncodingHost {
    fn current_context(&self) -> Option<RequestContext>;

    /// Last write wins.
    fn set_current_context(&mut self, context: Option<RequestContext>);

    /// The content type the response is configured with, if any.
    fn response_content_type(&self) -> Option<&str>;

    fn config(&self) -> &PipelineConfig;
}

/// The slot value an [`enter`] replaced; hand it back to [`exit`].
#[must_use = "the prior context must be restored with exit()"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorContext(Option<RequestContext>);

pub fn current(host: &dyn EncodingHost) -> Option<RequestContext> {
    host.current_context()
}

/// Install `context`, returning the value it replaced.
pub fn enter(host: &mut dyn EncodingHost, context: RequestContext) -> PriorContext {
    let prior = PriorContext(host.current_context());
    trace!(content_type = %context.content_type, discard = context.is_discard(), "enter context");
    host.set_current_context(Some(context));
    prior
}

/// Restore the value saved by [`enter`].
pub fn exit(host: &mut dyn EncodingHost, prior: PriorContext) {
    trace!(restored = ?prior.0.map(|c| c.content_type), "exit context");
    host.set_current_context(prior.0);
}

/// The container type for an outermost producer: the response content
/// type, or the configured default when the response has none.
pub fn resolve_container_type(host: &dyn EncodingHost) -> Result<MediaType> {
    let media_type = match host.response_content_type() {
        Some(content_type) => MediaType::by_content_type(content_type)?,
        None => host.config().default_media_type()?,
    };
    debug!(container_type = %media_type, "container type from response");
    Ok(media_type)
}

/// An in-process [`EncodingHost`] for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    context: Option<RequestContext>,
    response_content_type: Option<String>,
    config: PipelineConfig,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the response content type.
    pub fn with_response_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.response_content_type = Some(content_type.into());
        self
    }

    pub fn set_response_content_type(&mut self, content_type: Option<String>) {
        self.response_content_type = content_type;
    }
}

impl EncodingHost for RequestScope {
    fn current_context(&self) -> Option<RequestContext> {
        self.context
    }

    fn set_current_context(&mut self, context: Option<RequestContext>) {
        self.context = context;
    }

    fn response_content_type(&self) -> Option<&str> {
        self.response_content_type.as_deref()
    }

    fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_exit_nest() {
        let mut scope = RequestScope::new();
        assert_eq!(current(&scope), None);

        let outer = enter(&mut scope, RequestContext::validating(MediaType::Xhtml));
        let inner = enter(&mut scope, RequestContext::DISCARD);
        assert_eq!(current(&scope), Some(RequestContext::DISCARD));
        assert_eq!(
            inner,
            PriorContext(Some(RequestContext::validating(MediaType::Xhtml)))
        );

        exit(&mut scope, inner);
        assert_eq!(
            current(&scope),
            Some(RequestContext::validating(MediaType::Xhtml))
        );
        exit(&mut scope, outer);
        assert_eq!(current(&scope), None);
    }

    #[test]
    fn test_discard_context() {
        assert!(RequestContext::DISCARD.is_discard());
        assert_eq!(RequestContext::DISCARD.content_type, MediaType::Text);
        for media_type in MediaType::ALL {
            assert!(
                RequestContext::DISCARD
                    .valid_input
                    .accepts_without_extra_work(media_type)
            );
        }
    }

    #[test]
    fn test_resolve_container_type() {
        let scope = RequestScope::new();
        assert_eq!(resolve_container_type(&scope).unwrap(), MediaType::Xhtml);

        let scope = RequestScope::new().with_response_content_type("text/css; charset=UTF-8");
        assert_eq!(resolve_container_type(&scope).unwrap(), MediaType::Css);

        let scope = RequestScope::new().with_response_content_type("image/png");
        assert!(resolve_container_type(&scope).is_err());
    }

    #[test]
    fn test_resolve_container_type_uses_configured_default() {
        let config = PipelineConfig::from_yaml("default-content-type: text/plain").unwrap();
        let scope = RequestScope::with_config(config);
        assert_eq!(resolve_container_type(&scope).unwrap(), MediaType::Text);
    }
}

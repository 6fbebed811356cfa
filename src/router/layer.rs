use super::pattern::{Matcher, PathMatch, PathPattern};
use super::RouterError;
use crate::{handler::Handler, methods::RouteMethod};
use hyper::Method;
use std::fmt;

/// One entry of a router's stack: a compiled path, the registration method
/// that created it, and a single handler.
pub(crate) struct Layer {
    pattern: String,
    matcher: Matcher,
    method: RouteMethod,
    handle: Handler,
}

impl Layer {
    pub fn new(
        path: &PathPattern,
        method: RouteMethod,
        handle: Handler,
    ) -> Result<Self, RouterError> {
        Ok(Self {
            pattern: path.to_string(),
            matcher: Matcher::compile(path, !method.is_mount())?,
            method,
            handle,
        })
    }

    pub fn handler(&self) -> &Handler {
        &self.handle
    }

    /// Mount layers hide their matched prefix from the handler they call.
    pub fn strips_prefix(&self) -> bool {
        self.method.is_mount()
    }

    pub fn matches(&self, path: &str, method: &Method) -> Option<PathMatch> {
        if !self.method.accepts(method) {
            return None;
        }

        self.matcher.matches(path)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("handle", &self.handle)
            .finish()
    }
}

use super::continuation::wrap_next;
use super::stack::MountTrace;
use super::terminal::wrap_send;
use super::MARKER;
use crate::handler::{Handler, HandlerKind, Request, Response};
use log::debug;
use std::sync::Arc;

/// Mount path captured from one registration call, shared by every handler
/// registered in that call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    path: String,
}

impl MountInfo {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Handler signatures the wrapper knows how to instrument.
///
/// | arity | request | response | continuation |
/// |-------|---------|----------|--------------|
/// | 2     | 0       | 1        | -            |
/// | 3     | 0       | 1        | 2            |
/// | 4     | 1       | 2        | 3            |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Endpoint,
    Middleware,
    ErrorAware,
}

impl Signature {
    /// `None` for arities where the request cannot be located.
    pub fn from_arity(arity: usize) -> Option<Self> {
        match arity {
            2 => Some(Signature::Endpoint),
            3 => Some(Signature::Middleware),
            4 => Some(Signature::ErrorAware),
            _ => None,
        }
    }

    pub fn request_index(self) -> usize {
        match self {
            Signature::Endpoint | Signature::Middleware => 0,
            Signature::ErrorAware => 1,
        }
    }

    pub fn response_index(self) -> usize {
        self.request_index() + 1
    }

    pub fn continuation_index(self) -> Option<usize> {
        match self {
            Signature::Endpoint => None,
            Signature::Middleware | Signature::ErrorAware => Some(self.response_index() + 1),
        }
    }
}

/// Wraps `original` so that entering it records `info` on the request's
/// mount path stack.
///
/// The wrapped handler keeps the original signature, so the dispatcher still
/// routes errors to it exactly as before. Already wrapped handlers and
/// handlers with an unsupported arity are returned unchanged.
pub fn wrap_handler(original: Handler, info: &Arc<MountInfo>) -> Handler {
    if original.has_marker(MARKER) {
        return original;
    }

    if Signature::from_arity(original.arity()).is_none() {
        debug!(
            "not instrumenting arity-{} handler under `{}`",
            original.arity(),
            info.path()
        );
        return original;
    }

    let info = Arc::clone(info);
    let wrapped = match original.kind().clone() {
        HandlerKind::Endpoint(f) => Handler::endpoint(move |req, res| {
            enter(&info, req, res);
            f(req, res)
        }),
        HandlerKind::Middleware(f) => Handler::middleware(move |req, res, next| {
            let trace = enter(&info, req, res);
            f(req, res, wrap_next(next, trace))
        }),
        HandlerKind::ErrorAware(f) => Handler::error_aware(move |err, req, res, next| {
            let trace = enter(&info, req, res);
            f(err, req, res, wrap_next(next, trace))
        }),
        HandlerKind::Inspect(_) => return original,
    };

    wrapped.with_marker(MARKER)
}

fn enter(info: &MountInfo, req: &mut Request, res: &mut Response) -> MountTrace {
    let trace = MountTrace::attach(req);
    trace.enter(info.path());
    wrap_send(res, &trace);
    trace
}

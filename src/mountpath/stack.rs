use crate::handler::Request;
use log::trace;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct TraceState {
    /// Created on the first push.
    stack: Option<Vec<String>>,
    /// Mount path of the most recently entered handler.
    current: Option<String>,
    /// Once set, never cleared.
    frozen: bool,
}

/// Per-request path stack, stored in the request extensions.
///
/// Clones share the same state, which lets the continuation and response
/// wrappers update the stack without holding the request.
#[derive(Debug, Clone, Default)]
pub struct MountTrace(Arc<Mutex<TraceState>>);

impl MountTrace {
    /// The trace attached to `req`, if any handler or accessor created one.
    pub fn of(req: &Request) -> Option<MountTrace> {
        req.extensions().get::<MountTrace>().cloned()
    }

    /// The trace attached to `req`, creating and attaching an empty one if needed.
    pub fn attach(req: &mut Request) -> MountTrace {
        if let Some(trace) = req.extensions().get::<MountTrace>() {
            return trace.clone();
        }

        let trace = MountTrace::default();
        req.extensions_mut().insert(trace.clone());
        trace
    }

    fn state(&self) -> MutexGuard<'_, TraceState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records handler entry: `path` becomes the current path and is pushed
    /// unless the stack is frozen.
    pub fn enter(&self, path: &str) {
        let mut state = self.state();
        state.current = Some(path.to_string());

        if state.frozen {
            trace!("stack frozen, not tracking `{}`", path);
            return;
        }

        state.stack.get_or_insert_with(Vec::new).push(path.to_string());
    }

    /// Undoes the latest push unless the stack is frozen.
    pub fn leave(&self) -> Option<String> {
        let mut state = self.state();
        if state.frozen {
            return None;
        }

        state.stack.as_mut().and_then(Vec::pop)
    }

    pub fn freeze(&self) {
        self.state().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.state().frozen
    }

    pub fn current(&self) -> Option<String> {
        self.state().current.clone()
    }

    /// Stack contents, oldest first.
    pub fn segments(&self) -> Vec<String> {
        self.state().stack.clone().unwrap_or_default()
    }

    pub fn normalized_path(&self) -> Option<String> {
        let state = self.state();
        match state.stack.as_deref() {
            Some(segments) if !segments.is_empty() => Some(normalize(segments)),
            _ => None,
        }
    }
}

/// Joins `segments` and normalizes the ends of the result.
///
/// A leading run of `/` followed by another character is dropped, every
/// trailing `/` is stripped, then a single `/` is prepended. Slashes inside
/// the joined path are kept as they are.
pub fn normalize<S: AsRef<str>>(segments: &[S]) -> String {
    let joined: String = segments.iter().map(AsRef::as_ref).collect();

    let body = match joined.find(|c| c != '/') {
        Some(start) => &joined[start..],
        None => joined.as_str(),
    };

    format!("/{}", body.trim_end_matches('/'))
}

/// Full mount path that produced the response so far, or `None` when no
/// instrumented handler has been entered yet.
pub fn normalized_path(req: &Request) -> Option<String> {
    MountTrace::of(req)?.normalized_path()
}

pub fn is_stack_frozen(req: &Request) -> bool {
    MountTrace::of(req).is_some_and(|trace| trace.is_frozen())
}

/// Freezes the stack of `req`. Calling it again has no further effect.
pub fn freeze_stack(req: &mut Request) {
    MountTrace::attach(req).freeze();
}

/// Mount path of the most recently entered instrumented handler.
pub fn current_mount_path(req: &Request) -> Option<String> {
    MountTrace::of(req)?.current()
}

/// Method-style access to the mount path of a request.
pub trait MountPathExt {
    fn mount_path(&self) -> Option<String>;
    fn current_mount_path(&self) -> Option<String>;
    fn is_mount_path_frozen(&self) -> bool;
    fn freeze_mount_path(&mut self);
}

impl MountPathExt for Request {
    fn mount_path(&self) -> Option<String> {
        normalized_path(self)
    }

    fn current_mount_path(&self) -> Option<String> {
        current_mount_path(self)
    }

    fn is_mount_path_frozen(&self) -> bool {
        is_stack_frozen(self)
    }

    fn freeze_mount_path(&mut self) {
        freeze_stack(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn request() -> Request {
        hyper::Request::builder().uri("/").body(Bytes::new()).unwrap()
    }

    #[test]
    fn normalization_only_touches_the_ends() {
        assert_eq!(normalize(&["/api", "/users"]), "/api/users");
        assert_eq!(normalize(&["//api//"]), "/api");
        assert_eq!(normalize(&["api"]), "/api");
        assert_eq!(normalize(&["/a", "//b"]), "/a//b");
        assert_eq!(normalize(&["/users", "/:id", "/"]), "/users/:id");
        assert_eq!(normalize(&["/", "/"]), "/");
        assert_eq!(normalize(&["/"]), "/");
    }

    #[test]
    fn fresh_request_has_no_path() {
        let req = request();

        assert_eq!(normalized_path(&req), None);
        assert_eq!(current_mount_path(&req), None);
        assert!(!is_stack_frozen(&req));
    }

    #[test]
    fn empty_stack_has_no_path() {
        let mut req = request();
        let trace = MountTrace::attach(&mut req);
        trace.enter("/api");
        trace.leave();

        assert_eq!(req.mount_path(), None);
        assert_eq!(req.current_mount_path().as_deref(), Some("/api"));
    }

    #[test]
    fn freezing_stops_every_mutation() {
        let mut req = request();
        let trace = MountTrace::attach(&mut req);
        trace.enter("/api");
        trace.enter("/users");

        req.freeze_mount_path();
        req.freeze_mount_path();
        assert!(req.is_mount_path_frozen());

        assert_eq!(trace.leave(), None);
        trace.enter("/late");

        assert_eq!(trace.segments(), vec!["/api", "/users"]);
        assert_eq!(normalized_path(&req).as_deref(), Some("/api/users"));
        assert_eq!(current_mount_path(&req).as_deref(), Some("/late"));
    }

    #[test]
    fn freeze_before_any_push_creates_the_state() {
        let mut req = request();
        freeze_stack(&mut req);

        assert!(is_stack_frozen(&req));
        MountTrace::attach(&mut req).enter("/never");
        assert_eq!(normalized_path(&req), None);
    }

    #[test]
    fn attach_returns_the_shared_trace() {
        let mut req = request();
        MountTrace::attach(&mut req).enter("/a");
        MountTrace::attach(&mut req).enter("/b");

        assert_eq!(normalized_path(&req).as_deref(), Some("/a/b"));
    }
}

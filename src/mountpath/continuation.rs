use super::stack::MountTrace;
use super::MARKER;
use crate::handler::Next;
use log::trace;

/// Wraps a handler's continuation so that advancing without an error pops
/// the segment the handler pushed.
///
/// Error continuations keep the stack intact so that error handlers see the
/// path that failed. Nothing is popped once the stack is frozen.
pub fn wrap_next(original: Next, trace: MountTrace) -> Next {
    original.wrap(MARKER, move |err| {
        if err.is_some() {
            return;
        }

        if let Some(segment) = trace.leave() {
            trace!("left `{}`", segment);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerError;

    fn trace_with(segments: &[&str]) -> MountTrace {
        let trace = MountTrace::default();
        for segment in segments {
            trace.enter(segment);
        }
        trace
    }

    #[test]
    fn normal_advance_pops_one_segment() {
        let trace = trace_with(&["/api", "/users"]);
        let (next, signal) = Next::channel();

        wrap_next(next, trace.clone()).call();

        assert_eq!(trace.segments(), vec!["/api"]);
        assert!(matches!(signal.take(), Some(None)));
    }

    #[test]
    fn error_advance_keeps_the_stack() {
        let trace = trace_with(&["/api", "/users"]);
        let (next, signal) = Next::channel();

        wrap_next(next, trace.clone()).fail(HandlerError::internal("boom"));

        assert_eq!(trace.segments(), vec!["/api", "/users"]);
        assert!(matches!(signal.take(), Some(Some(_))));
    }

    #[test]
    fn frozen_stack_is_not_popped() {
        let trace = trace_with(&["/api"]);
        trace.freeze();
        let (next, _signal) = Next::channel();

        wrap_next(next, trace.clone()).call();

        assert_eq!(trace.normalized_path().as_deref(), Some("/api"));
    }

    #[test]
    fn wrapping_twice_pops_once() {
        let trace = trace_with(&["/a", "/b", "/c"]);
        let (next, _signal) = Next::channel();

        let once = wrap_next(next, trace.clone());
        assert!(once.has_marker(MARKER));
        wrap_next(once, trace.clone()).call();

        assert_eq!(trace.segments(), vec!["/a", "/b"]);
    }

    #[test]
    fn popping_an_absent_stack_is_harmless() {
        let trace = MountTrace::default();
        let (next, signal) = Next::channel();

        wrap_next(next, trace.clone()).call();

        assert_eq!(trace.normalized_path(), None);
        assert!(signal.take().is_some());
    }
}

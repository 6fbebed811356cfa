use super::stack::MountTrace;
use super::MARKER;
use crate::handler::Response;

/// Freezes `trace` as soon as `res` starts sending a body.
///
/// Returns `false` when the response already carries this hook.
pub fn wrap_send(res: &mut Response, trace: &MountTrace) -> bool {
    let trace = trace.clone();
    res.wrap_send(MARKER, move || trace.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn send_freezes_the_stack() {
        let trace = MountTrace::default();
        trace.enter("/api");
        let mut res = Response::new();

        assert!(wrap_send(&mut res, &trace));
        assert!(!trace.is_frozen());

        res.send("body");
        assert!(trace.is_frozen());

        trace.enter("/after");
        assert_eq!(trace.leave(), None);
        assert_eq!(trace.normalized_path().as_deref(), Some("/api"));
    }

    #[test]
    fn redirect_and_end_do_not_freeze() {
        let trace = MountTrace::default();
        trace.enter("/old");
        let mut res = Response::new();
        wrap_send(&mut res, &trace);

        res.redirect(HeaderValue::from_static("/new"));
        res.end();

        assert!(!trace.is_frozen());
        assert_eq!(trace.leave().as_deref(), Some("/old"));
    }

    #[test]
    fn the_hook_is_installed_once_per_response() {
        let trace = MountTrace::default();
        let mut res = Response::new();

        assert!(wrap_send(&mut res, &trace));
        assert!(!wrap_send(&mut res, &trace));
        assert!(res.is_send_wrapped(MARKER));
    }
}

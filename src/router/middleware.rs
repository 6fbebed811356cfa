use crate::{handler::Handler, router::PathPattern};

/// Reusable middleware that knows where it wants to be mounted.
pub trait Middleware {
    /// Mount path, or `None` to mount without an explicit path.
    fn target_path(&self) -> Option<PathPattern> {
        None
    }

    fn create_handler(&self) -> Handler;
}

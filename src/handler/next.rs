use super::HandlerError;
use crate::intercept::WrapMarker;
use smallvec::SmallVec;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

type Advance = Arc<dyn Fn(Option<HandlerError>) + Send + Sync>;

/// Continuation handed to `(req, res, next)` and `(err, req, res, next)` handlers.
///
/// Calling it tells the dispatcher to move on to the next matching layer.
/// Passing an error switches the dispatcher into error mode, where only
/// error-aware handlers run. The call must happen before the handler's
/// future resolves.
#[derive(Clone)]
pub struct Next {
    advance: Advance,
    markers: SmallVec<[WrapMarker; 1]>,
}

/// Dispatcher side of a [`Next`]: records how the handler asked to proceed.
#[derive(Clone, Default)]
pub(crate) struct NextSignal(Arc<Mutex<Option<Option<HandlerError>>>>);

impl NextSignal {
    /// `None` if the handler never called `next`, `Some(err)` otherwise.
    pub(crate) fn take(&self) -> Option<Option<HandlerError>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Next {
    pub(crate) fn channel() -> (Next, NextSignal) {
        let signal = NextSignal::default();
        let slot = Arc::clone(&signal.0);
        let next = Next {
            advance: Arc::new(move |err| {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
            }),
            markers: SmallVec::new(),
        };

        (next, signal)
    }

    /// Proceed to the next matching handler.
    pub fn call(&self) {
        self.advance(None);
    }

    /// Skip to the next error-aware handler with `err`.
    pub fn fail(&self, err: impl Into<HandlerError>) {
        self.advance(Some(err.into()));
    }

    pub fn advance(&self, err: Option<HandlerError>) {
        (self.advance)(err)
    }

    pub fn has_marker(&self, marker: WrapMarker) -> bool {
        self.markers.contains(&marker)
    }

    /// Returns a continuation that runs `before` and then delegates to `self`.
    ///
    /// A continuation already carrying `marker` is returned unchanged.
    pub fn wrap<F>(self, marker: WrapMarker, before: F) -> Next
    where
        F: Fn(Option<&HandlerError>) + Send + Sync + 'static,
    {
        if self.has_marker(marker) {
            return self;
        }

        let original = self.advance;
        let mut markers = self.markers;
        markers.push(marker);

        Next {
            advance: Arc::new(move |err| {
                before(err.as_ref());
                original(err)
            }),
            markers,
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("markers", &self.markers)
            .finish()
    }
}

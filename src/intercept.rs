//! Process-wide registration method table.
//!
//! Every registration call made on an [`App`](crate::App) or a
//! [`Router`](crate::Router) passes through [`METHOD_TABLE`] before it
//! reaches the router. A slot is keyed by the receiving [`Surface`] and the
//! [`RouteMethod`]; interceptors installed in a slot may rewrite the
//! [`MountCall`] arguments in place. Instances built before an interceptor is
//! installed see it on their next registration.

use crate::handler::Handler;
use crate::methods::RouteMethod;
use crate::router::{PathPattern, Router};
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Which public type received the registration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Application,
    Router,
}

impl Surface {
    pub const ALL: [Surface; 2] = [Surface::Application, Surface::Router];
}

/// Identifies one wrapper so that applying it twice is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WrapMarker(&'static str);

impl WrapMarker {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

/// One positional argument of a registration call.
#[derive(Debug, Clone)]
pub enum MountArg {
    Path(PathPattern),
    Handler(Handler),
    List(Vec<MountArg>),
}

impl MountArg {
    /// A handler, or a list whose first element is a handler.
    pub fn is_handler_like(&self) -> bool {
        match self {
            MountArg::Handler(_) => true,
            MountArg::List(items) => matches!(items.first(), Some(MountArg::Handler(_))),
            MountArg::Path(_) => false,
        }
    }
}

impl From<Handler> for MountArg {
    fn from(handler: Handler) -> Self {
        MountArg::Handler(handler)
    }
}

impl From<Router> for MountArg {
    fn from(router: Router) -> Self {
        MountArg::Handler(router.into())
    }
}

impl From<PathPattern> for MountArg {
    fn from(path: PathPattern) -> Self {
        MountArg::Path(path)
    }
}

/// Conversion into the handler arguments of a registration call.
pub trait IntoMountArgs {
    fn into_mount_args(self) -> Vec<MountArg>;
}

impl IntoMountArgs for Handler {
    fn into_mount_args(self) -> Vec<MountArg> {
        vec![MountArg::Handler(self)]
    }
}

impl IntoMountArgs for Router {
    fn into_mount_args(self) -> Vec<MountArg> {
        vec![MountArg::from(self)]
    }
}

/// Passed as a single list argument, like an array of handlers in Express.
impl IntoMountArgs for Vec<Handler> {
    fn into_mount_args(self) -> Vec<MountArg> {
        vec![MountArg::List(self.into_iter().map(MountArg::Handler).collect())]
    }
}

impl<const N: usize> IntoMountArgs for [Handler; N] {
    fn into_mount_args(self) -> Vec<MountArg> {
        Vec::from(self).into_mount_args()
    }
}

impl IntoMountArgs for MountArg {
    fn into_mount_args(self) -> Vec<MountArg> {
        vec![self]
    }
}

/// Each element becomes its own positional argument.
impl IntoMountArgs for Vec<MountArg> {
    fn into_mount_args(self) -> Vec<MountArg> {
        self
    }
}

/// Arguments of one registration call, in call order.
#[derive(Debug, Clone, Default)]
pub struct MountCall {
    args: Vec<MountArg>,
}

impl MountCall {
    pub fn new(args: Vec<MountArg>) -> Self {
        Self { args }
    }

    pub fn with_path(path: impl Into<PathPattern>, handlers: impl IntoMountArgs) -> Self {
        let mut args = vec![MountArg::Path(path.into())];
        args.extend(handlers.into_mount_args());
        Self { args }
    }

    pub fn without_path(handlers: impl IntoMountArgs) -> Self {
        Self {
            args: handlers.into_mount_args(),
        }
    }

    pub fn args(&self) -> &[MountArg] {
        &self.args
    }

    pub fn args_mut(&mut self) -> &mut Vec<MountArg> {
        &mut self.args
    }

    pub fn into_args(self) -> Vec<MountArg> {
        self.args
    }
}

/// Rewrites the arguments of a registration call before it is applied.
pub type Interceptor = Arc<dyn Fn(&mut MountCall) + Send + Sync>;

type Slot = SmallVec<[(WrapMarker, Interceptor); 1]>;

/// The method table shared by every `App` and `Router` in the process.
#[derive(Default)]
pub struct MethodTable {
    slots: RwLock<HashMap<(Surface, RouteMethod), Slot>>,
}

pub static METHOD_TABLE: Lazy<MethodTable> = Lazy::new(MethodTable::default);

impl MethodTable {
    /// Installs `interceptor` on one slot.
    ///
    /// Returns `false` and leaves the slot untouched when it already carries `marker`.
    pub fn wrap(
        &self,
        surface: Surface,
        method: RouteMethod,
        marker: WrapMarker,
        interceptor: Interceptor,
    ) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry((surface, method)).or_default();

        if slot.iter().any(|(m, _)| *m == marker) {
            return false;
        }

        slot.push((marker, interceptor));
        true
    }

    pub fn is_wrapped(&self, surface: Surface, method: RouteMethod, marker: WrapMarker) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(surface, method))
            .is_some_and(|slot| slot.iter().any(|(m, _)| *m == marker))
    }

    /// Runs the slot's interceptors, the most recently installed first, then `original`.
    pub fn invoke<R>(
        &self,
        surface: Surface,
        method: RouteMethod,
        mut call: MountCall,
        original: impl FnOnce(MountCall) -> R,
    ) -> R {
        let interceptors: Vec<Interceptor> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(surface, method))
            .map(|slot| slot.iter().rev().map(|(_, i)| Arc::clone(i)).collect())
            .unwrap_or_default();

        for interceptor in interceptors {
            interceptor(&mut call);
        }

        original(call)
    }
}

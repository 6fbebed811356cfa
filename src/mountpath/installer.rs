use super::MARKER;
use super::mount_call::instrument_mount_call;
use super::options::InstallOptions;
use crate::intercept::{Interceptor, METHOD_TABLE};
use crate::methods::RouteMethod;
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

static PATCHED: AtomicBool = AtomicBool::new(false);

/// Registration methods instrumented by [`install`].
pub const DEFAULT_METHODS: [RouteMethod; 6] = [
    RouteMethod::Use,
    RouteMethod::Get,
    RouteMethod::Post,
    RouteMethod::Put,
    RouteMethod::Delete,
    RouteMethod::Patch,
];

/// Instruments the default registration methods of every `App` and `Router`.
///
/// Only the first call in a process has any effect; it returns `true`.
pub fn install() -> bool {
    install_with(&InstallOptions::default())
}

/// Like [`install`], with an explicit choice of methods and surfaces.
pub fn install_with(options: &InstallOptions) -> bool {
    if PATCHED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        debug!("mount path tracking already installed");
        return false;
    }

    let interceptor: Interceptor = Arc::new(instrument_mount_call);
    let mut slots = 0;
    for &surface in &options.surfaces {
        for &method in &options.methods {
            if METHOD_TABLE.wrap(surface, method, MARKER, Arc::clone(&interceptor)) {
                slots += 1;
            }
        }
    }

    info!("mount path tracking installed on {} registration method(s)", slots);
    true
}

pub fn is_installed() -> bool {
    PATCHED.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::Surface;

    #[test]
    fn installing_twice_is_a_noop() {
        install();
        assert!(is_installed());
        assert!(!install());
        assert!(!install_with(&InstallOptions::default()));

        for surface in Surface::ALL {
            for method in DEFAULT_METHODS {
                assert!(METHOD_TABLE.is_wrapped(surface, method, MARKER));
            }
        }
    }
}

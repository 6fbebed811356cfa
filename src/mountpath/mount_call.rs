use super::handler_wrap::{MountInfo, wrap_handler};
use crate::intercept::{MountArg, MountCall};
use log::trace;
use std::sync::Arc;

/// Interceptor installed on every instrumented registration method.
///
/// When the call starts with a path, every handler after it (including
/// handlers nested in lists at any depth) is wrapped with that path. Calls
/// without a leading path, or with a path that coerces to the empty string,
/// are left untouched.
pub fn instrument_mount_call(call: &mut MountCall) {
    let Some((first, rest)) = call.args_mut().split_first_mut() else {
        return;
    };

    if first.is_handler_like() {
        return;
    }

    let MountArg::Path(pattern) = first else {
        return;
    };

    let path = pattern.to_string();
    if path.is_empty() {
        return;
    }

    trace!("instrumenting {} handler argument(s) under `{}`", rest.len(), path);

    let info = Arc::new(MountInfo::new(path));
    for arg in rest {
        wrap_arg(arg, &info);
    }
}

fn wrap_arg(arg: &mut MountArg, info: &Arc<MountInfo>) {
    match arg {
        MountArg::Handler(handler) => {
            *handler = wrap_handler(handler.clone(), info);
        }
        MountArg::List(items) => {
            for item in items {
                wrap_arg(item, info);
            }
        }
        MountArg::Path(_) => {}
    }
}

/*!
Process-exit hook that drains every live tracker
*/

use std::{
    mem,
    sync::{Arc, Once, Weak},
    time::Duration,
};

use parking_lot::{Mutex, const_mutex};
use tracing::trace;

use crate::tracker::Registry;

/// Longest the exit hook waits on any single lock.
///
/// A thread still running at exit may hold a registry; waiting forever would
/// hang the process on its way out.
pub(crate) const EXIT_LOCK_WAIT: Duration = Duration::from_millis(250);

static INSTALL: Once = Once::new();
static LIVE: Mutex<Vec<Weak<Registry>>> = const_mutex(Vec::new());

/// Track `registry` so it is drained at normal process exit.
///
/// The C `atexit` hook is installed on the first call only.
pub(crate) fn register(registry: &Arc<Registry>) {
    INSTALL.call_once(|| {
        // SAFETY: `drain_at_exit` is a plain `extern "C" fn()` with no captured state.
        let rc = unsafe { libc::atexit(drain_at_exit) };
        trace!(rc, "installed file removal exit hook");
    });

    let mut live = LIVE.lock();
    live.retain(|weak| weak.strong_count() > 0);
    live.push(Arc::downgrade(registry));
}

/// Stop tracking `registry`; called once its owner has drained it on drop.
pub(crate) fn unregister(registry: &Arc<Registry>) {
    let target = Arc::downgrade(registry);
    LIVE.lock()
        .retain(|weak| weak.strong_count() > 0 && !Weak::ptr_eq(weak, &target));
}

#[cfg(test)]
pub(crate) fn is_registered(registry: &Arc<Registry>) -> bool {
    let target = Arc::downgrade(registry);
    LIVE.lock().iter().any(|weak| Weak::ptr_eq(weak, &target))
}

// Runs after `main` has returned or `std::process::exit` was called. Must not
// panic and must not block indefinitely. No logging: the subscriber may
// already be torn down.
extern "C" fn drain_at_exit() {
    let live = match LIVE.try_lock_for(EXIT_LOCK_WAIT) {
        Some(mut guard) => mem::take(&mut *guard),
        None => return,
    };

    for registry in live.iter().filter_map(Weak::upgrade) {
        registry.drain_within(EXIT_LOCK_WAIT);
    }
}
